//! Data models for test file execution
//!
//! This module contains all data structures shared by discovery, the
//! scheduler and the output formatters.

mod run_result;
mod work_item;

pub use run_result::{RunOutcome, RunResult, RunSummary};
pub use work_item::WorkItem;
