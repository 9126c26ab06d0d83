//! Configuration module
//!
//! Handles loading and managing configuration.

mod env;
mod file;
mod profile;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;
pub use profile::RunProfile;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RunnerError;

/// Share of the available parallelism used by default
const DEFAULT_CPU_SHARE: f64 = 0.8;

/// Default concurrency bound: 80% of the available parallelism, floored, at least 1
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    concurrency_for(cpus)
}

fn concurrency_for(cpus: usize) -> usize {
    ((cpus as f64 * DEFAULT_CPU_SHARE).floor() as usize).max(1)
}

/// External command used to execute work items
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Program to spawn
    pub program: String,

    /// Arguments placed before the work item path(s)
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Full command line as a single display string
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Coverage wrapper configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Coverage tool wrapping the runner command
    pub command: CommandConfig,

    /// Report location printed after a coverage run
    pub report_path: String,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            command: CommandConfig::new("c8")
                .arg("--reporter=text")
                .arg("--reporter=lcov")
                .arg("--all")
                .arg("--src=.")
                .arg("--include=src/**/*.ts")
                .arg("--exclude=**/*.test.ts"),
            report_path: "./coverage/lcov.info".to_string(),
        }
    }
}

/// Test file discovery configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Directory walked recursively
    pub root: PathBuf,

    /// Glob patterns matched against paths below the working directory
    pub patterns: Vec<String>,
}

impl DiscoveryConfig {
    /// Move discovery to `root`, carrying along patterns anchored at the previous root
    pub fn rebase(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        let old_prefix = format!("{}/", normalize(&self.root));
        let new_prefix = format!("{}/", normalize(&root));

        for pattern in &mut self.patterns {
            if let Some(rest) = pattern.strip_prefix(&old_prefix) {
                *pattern = format!("{new_prefix}{rest}");
            }
        }
        self.root = root;
    }
}

/// Root path as it appears at the start of a pattern
fn normalize(root: &Path) -> String {
    let text = root.to_string_lossy().replace('\\', "/");
    text.trim_start_matches("./").trim_end_matches('/').to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src"),
            patterns: vec!["src/**/*.test.ts".to_string()],
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Command that runs one test file
    pub runner: CommandConfig,

    /// Coverage mode settings
    pub coverage: CoverageConfig,

    /// Test file discovery
    pub discovery: DiscoveryConfig,

    /// Maximum concurrent test processes (None = derived from CPU count)
    pub max_concurrency: Option<usize>,

    /// Per-file timeout in seconds (None = wait indefinitely)
    pub timeout_secs: Option<u64>,

    /// Extra environment variables for every child process
    pub env: BTreeMap<String, String>,

    /// Colourise terminal output
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert("deepkit_test_mode".to_string(), "true".to_string());

        Self {
            runner: CommandConfig::new("vite-node"),
            coverage: CoverageConfig::default(),
            discovery: DiscoveryConfig::default(),
            max_concurrency: None,
            timeout_secs: None,
            env,
            color: true,
        }
    }
}

impl AppConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.runner.program.trim().is_empty() {
            return Err(RunnerError::InvalidConfig(
                "runner program must not be empty".to_string(),
            ));
        }
        if self.discovery.patterns.is_empty() {
            return Err(RunnerError::InvalidConfig(
                "at least one discovery pattern is required".to_string(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(RunnerError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(RunnerError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective concurrency bound
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(default_concurrency)
    }

    /// Effective per-file timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Apply a named profile on top of this configuration
    pub fn apply_profile(&mut self, profile: &RunProfile) {
        if let Some(root) = &profile.root {
            self.discovery.root = root.clone();
        }
        if !profile.patterns.is_empty() {
            self.discovery.patterns = profile.patterns.clone();
        }
        if let Some(runner) = &profile.runner {
            self.runner = runner.clone();
        }
        if profile.max_concurrency.is_some() {
            self.max_concurrency = profile.max_concurrency;
        }
        if profile.timeout_secs.is_some() {
            self.timeout_secs = profile.timeout_secs;
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(concurrency) = env.concurrency {
            self.max_concurrency = Some(concurrency);
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = Some(timeout);
        }
        if let Some(runner) = &env.runner {
            self.runner.program = runner.clone();
        }
        if let Some(false) = env.color {
            self.color = false;
        }
    }
}
