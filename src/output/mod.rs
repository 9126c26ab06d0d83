//! Output formatting module
//!
//! Provides summary rendering and report files for completed runs.

mod formatter;
mod report;

pub use formatter::{OutputFormat, ResultFormatter};
pub use report::RunReport;
