//! Test file discovery
//!
//! Walks a root directory once and collects every file whose path matches
//! one of the configured glob patterns.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::WorkItem;

/// Recursive pattern-based test file discovery
pub struct Discovery {
    base: PathBuf,
    root: PathBuf,
    patterns: Vec<String>,
    matcher: GlobSet,
}

impl Discovery {
    /// Create a discovery rooted at `root`, matching paths relative to the current directory
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        Self::with_base(".", root, patterns)
    }

    /// Create a discovery whose paths are matched relative to `base`
    pub fn with_base(
        base: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
        patterns: &[String],
    ) -> Result<Self> {
        Ok(Self {
            base: base.into(),
            root: root.into(),
            patterns: patterns.to_vec(),
            matcher: build_glob_set(patterns)?,
        })
    }

    /// Patterns joined for display
    pub fn describe(&self) -> String {
        self.patterns.join(", ")
    }

    /// Walk the root directory and return matching files, sorted
    pub fn discover(&self) -> Result<Vec<WorkItem>> {
        let root = self.base.join(&self.root);
        if !root.exists() {
            debug!("Discovery root {} does not exist", root.display());
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_to(entry.path(), &self.base);
            if self.matcher.is_match(&relative) {
                items.push(WorkItem::new(relative));
            }
        }

        items.sort();
        debug!(
            "Discovered {} test file(s) under {} matching [{}]",
            items.len(),
            root.display(),
            self.describe()
        );
        Ok(items)
    }
}

/// Turn explicit command-line arguments into work items, keeping their order
pub fn explicit(items: &[String]) -> Vec<WorkItem> {
    items.iter().map(|s| WorkItem::from(s.as_str())).collect()
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Build a GlobSet from pattern strings. `*` does not cross directory separators.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("Failed to build glob set")
}
