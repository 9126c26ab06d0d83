//! Run result models
//!
//! Defines the tagged outcome of one work item, its recorded result and the
//! summary aggregated over a whole run.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WorkItem;

/// Outcome of running a single work item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Process exited with status 0
    Success,
    /// Process exited non-zero or was terminated by a signal
    Failure {
        code: Option<i32>,
        signal: Option<i32>,
    },
    /// Process exceeded the per-item timeout and was killed
    TimedOut { after_secs: u64 },
    /// Process could not be spawned at all
    LaunchFailed { message: String },
}

impl RunOutcome {
    #[cfg(test)]
    pub fn failure(code: i32) -> Self {
        RunOutcome::Failure {
            code: Some(code),
            signal: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RunOutcome::Success => "✔",
            RunOutcome::Failure { .. } => "✖",
            RunOutcome::TimedOut { .. } => "⏱",
            RunOutcome::LaunchFailed { .. } => "!",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "PASS"),
            RunOutcome::Failure {
                code: Some(code), ..
            } => write!(f, "FAIL (exit code {code})"),
            RunOutcome::Failure {
                signal: Some(signal),
                ..
            } => write!(f, "FAIL (killed by signal {signal})"),
            RunOutcome::Failure { .. } => write!(f, "FAIL"),
            RunOutcome::TimedOut { after_secs } => write!(f, "TIMEOUT after {after_secs}s"),
            RunOutcome::LaunchFailed { message } => write!(f, "LAUNCH ERROR: {message}"),
        }
    }
}

/// Recorded result of one work item's process
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub item: WorkItem,
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub stderr: String,
}

impl RunResult {
    pub fn new(item: WorkItem, outcome: RunOutcome, duration_ms: u64) -> Self {
        Self {
            item,
            outcome,
            duration_ms,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    #[cfg(test)]
    pub fn success(item: WorkItem, duration_ms: u64) -> Self {
        Self::new(item, RunOutcome::Success, duration_ms)
    }

    pub fn launch_failed(item: WorkItem, message: impl Into<String>) -> Self {
        Self::new(
            item,
            RunOutcome::LaunchFailed {
                message: message.into(),
            },
            0,
        )
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms] {}",
            self.outcome.symbol(),
            self.item,
            self.duration_ms,
            self.outcome
        )
    }
}

/// Summary of a complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub launch_errors: usize,
    pub timed_out: usize,
    pub concurrency: usize,
    pub peak_in_flight: usize,
    pub duration_ms: u64,
    pub results: Vec<RunResult>,
}

impl RunSummary {
    pub fn new(
        results: Vec<RunResult>,
        concurrency: usize,
        peak_in_flight: usize,
        duration_ms: u64,
    ) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.is_success()).count();
        let launch_errors = results
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::LaunchFailed { .. }))
            .count();
        let timed_out = results
            .iter()
            .filter(|r| matches!(r.outcome, RunOutcome::TimedOut { .. }))
            .count();

        Self {
            total,
            passed,
            failed: total - passed,
            launch_errors,
            timed_out,
            concurrency,
            peak_in_flight,
            duration_ms,
            results,
        }
    }

    /// Results that did not succeed, in dispatch order
    pub fn failures(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    /// Process exit code for this run
    pub fn exit_code(&self) -> i32 {
        if self.is_all_passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> WorkItem {
        WorkItem::from(name)
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(RunOutcome::Success.to_string(), "PASS");
        assert_eq!(RunOutcome::failure(2).to_string(), "FAIL (exit code 2)");
        assert_eq!(
            RunOutcome::Failure {
                code: None,
                signal: Some(9)
            }
            .to_string(),
            "FAIL (killed by signal 9)"
        );
        assert_eq!(
            RunOutcome::TimedOut { after_secs: 5 }.to_string(),
            "TIMEOUT after 5s"
        );
    }

    #[test]
    fn test_launch_error_is_distinguishable() {
        let result = RunResult::launch_failed(item("a.test.ts"), "No such file or directory");
        assert!(!result.is_success());
        assert!(result.to_string().contains("LAUNCH ERROR: No such file"));
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            RunResult::success(item("a"), 10),
            RunResult::new(item("b"), RunOutcome::failure(1), 20).with_output("", "boom"),
            RunResult::launch_failed(item("c"), "missing runner"),
            RunResult::new(item("d"), RunOutcome::TimedOut { after_secs: 1 }, 1000),
        ];

        let summary = RunSummary::new(results, 2, 2, 1200);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.launch_errors, 1);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.exit_code(), 1);

        let failed: Vec<_> = summary.failures().map(|r| r.item.id()).collect();
        assert_eq!(failed, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_summary_all_passed() {
        let summary = RunSummary::new(vec![RunResult::success(item("a"), 1)], 4, 1, 1);
        assert!(summary.is_all_passed());
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.pass_rate(), 100.0);
    }

    #[test]
    fn test_result_json_shape() {
        let result = RunResult::new(item("a.test.ts"), RunOutcome::failure(1), 5);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["item"], "a.test.ts");
        assert_eq!(value["status"], "failure");
        assert_eq!(value["code"], 1);
        assert!(value.get("stdout").is_none());
    }
}
