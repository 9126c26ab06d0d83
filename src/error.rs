//! Runner error taxonomy
//!
//! Per-item failures never surface here; they are recorded as a
//! [`RunOutcome`](crate::models::RunOutcome). Only conditions fatal to the
//! whole run are errors.

use thiserror::Error;

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("No test files found (patterns: {patterns})")]
    NoWorkItems { patterns: String },

    #[error("Scheduler fault: {0}")]
    SchedulerFault(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RunnerError::NoWorkItems {
            patterns: "src/**/*.test.ts".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No test files found (patterns: src/**/*.test.ts)"
        );

        let err = RunnerError::InvalidConfig("concurrency must be at least 1".to_string());
        assert!(err.to_string().starts_with("Invalid configuration"));
    }
}
