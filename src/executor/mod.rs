//! Test execution engine
//!
//! Provides the bounded parallel scheduler, the child process launcher and
//! the single-process coverage mode.

mod coverage;
mod launcher;
mod progress;
mod scheduler;

pub use coverage::CoverageRun;
pub use launcher::ProcessLauncher;
pub use progress::{Progress, ProgressMode};
pub use scheduler::Scheduler;
