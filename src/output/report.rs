//! Saved run reports
//!
//! Persists a completed run as a JSON document.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::models::RunSummary;

/// Report of one complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID
    pub id: String,

    /// Command line used for each test file
    pub runner: String,

    /// Timestamp when the run started
    pub started_at: DateTime<Utc>,

    /// Timestamp when the run completed
    pub completed_at: DateTime<Utc>,

    /// Aggregated results
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(runner: impl Into<String>, started_at: DateTime<Utc>, summary: RunSummary) -> Self {
        Self {
            id: generate_run_id(),
            runner: runner.into(),
            started_at,
            completed_at: Utc::now(),
            summary,
        }
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context("Failed to write report")?;

        info!("Saved run report to {}", path.display());
        Ok(())
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}
