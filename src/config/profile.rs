//! Run profiles
//!
//! Provides named presets for the unit and CI test suites.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::CommandConfig;

/// Named preset applied on top of the base configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunProfile {
    /// Profile name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Discovery root override
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Discovery pattern override
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Runner command override
    #[serde(default)]
    pub runner: Option<CommandConfig>,
    /// Concurrency override
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    /// Timeout override
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RunProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Unit test files under src/
    pub fn unit() -> Self {
        Self::new("unit")
            .with_description("Unit test files under src/")
            .with_root("src")
            .with_pattern("src/**/*.test.ts")
    }

    /// CI integration test files under ci/
    pub fn ci() -> Self {
        Self::new("ci")
            .with_description("CI integration test files under ci/")
            .with_root("ci")
            .with_pattern("ci/**/*.ci.*.ts")
            .with_pattern("ci/**/*.ci.*.js")
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    /// Built-in profiles
    pub fn predefined() -> Vec<RunProfile> {
        vec![Self::unit(), Self::ci()]
    }

    /// Find a built-in profile by name
    pub fn find(name: &str) -> Option<RunProfile> {
        Self::predefined().into_iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_profile() {
        let profile = RunProfile::unit();
        assert_eq!(profile.root, Some(PathBuf::from("src")));
        assert_eq!(profile.patterns, vec!["src/**/*.test.ts"]);
    }

    #[test]
    fn test_ci_profile_patterns() {
        let profile = RunProfile::ci();
        assert_eq!(profile.patterns.len(), 2);
    }

    #[test]
    fn test_find_profile() {
        assert!(RunProfile::find("ci").is_some());
        assert!(RunProfile::find("nightly").is_none());
    }

    #[test]
    fn test_profile_builder() {
        let profile = RunProfile::new("slow").with_concurrency(1);
        assert_eq!(profile.max_concurrency, Some(1));
        assert!(profile.runner.is_none());
    }
}
