//! Coverage mode
//!
//! Runs every work item inside a single coverage-wrapped process so the
//! coverage tool can aggregate across files. The concurrency bound does not
//! apply here.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use crate::config::{CommandConfig, CoverageConfig};
use crate::models::WorkItem;

/// Single-process coverage run
pub struct CoverageRun {
    coverage: CoverageConfig,
    runner: CommandConfig,
    env: BTreeMap<String, String>,
}

impl CoverageRun {
    pub fn new(coverage: CoverageConfig, runner: CommandConfig) -> Self {
        Self {
            coverage,
            runner,
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Arguments passed to the coverage program
    pub fn args(&self, items: &[WorkItem]) -> Vec<String> {
        self.coverage
            .command
            .args
            .iter()
            .cloned()
            .chain(std::iter::once(self.runner.program.clone()))
            .chain(self.runner.args.iter().cloned())
            .chain(items.iter().map(WorkItem::id))
            .collect()
    }

    /// Run all items with inherited stdio and return the process exit code
    pub async fn run(&self, items: &[WorkItem]) -> Result<i32> {
        let args = self.args(items);
        info!(
            "Running {} test file(s) under {}",
            items.len(),
            self.coverage.command.program
        );

        let status = Command::new(&self.coverage.command.program)
            .args(&args)
            .envs(&self.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| {
                format!(
                    "Failed to launch coverage tool `{}`",
                    self.coverage.command.program
                )
            })?;

        println!(
            "\nCoverage report: {} (lcov, for editor coverage gutters)",
            self.coverage.report_path
        );

        Ok(status.code().unwrap_or(1))
    }
}
