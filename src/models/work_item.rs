//! Work item model
//!
//! A work item is one independently executable test file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One unit of work dispatched as an isolated child process
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem {
    path: PathBuf,
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier used in progress lines and summaries
    pub fn id(&self) -> String {
        self.path.display().to_string()
    }
}

impl From<&str> for WorkItem {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for WorkItem {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_id() {
        let item = WorkItem::from("src/app.test.ts");
        assert_eq!(item.id(), "src/app.test.ts");
        assert_eq!(item.to_string(), "src/app.test.ts");
        assert_eq!(item.path(), Path::new("src/app.test.ts"));
    }

    #[test]
    fn test_work_item_serializes_as_path() {
        let item = WorkItem::from("src/a.test.ts");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, "\"src/a.test.ts\"");
    }
}
