//! Output formatters for run summaries
//!
//! Provides text and JSON output formats.

use crate::models::{RunResult, RunSummary};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            _ => None,
        }
    }
}

/// Summary formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
    /// Output was streamed live, so captured output is not repeated
    streamed: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
            streamed: false,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn streamed(mut self, streamed: bool) -> Self {
        self.streamed = streamed;
        self
    }

    /// Format a completed run
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Text => self.format_summary_text(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
        }
    }

    fn format_summary_text(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        if summary.is_all_passed() {
            output.push_str(&self.green(&format!(
                "✔ All {} test file(s) passed",
                summary.total
            )));
            output.push('\n');
        } else {
            output.push_str(&format!("\n{} test file(s) failed:\n", summary.failed));
            for result in summary.failures() {
                output.push_str(&self.red(&format!("  ✖ {}", result.item)));
                output.push_str(&format!("  [{}]\n", result.outcome));
                if !self.streamed {
                    output.push_str(&format_captured(result));
                }
            }
        }

        output.push_str(&format!(
            "\nTotal: {} | Pass: {} | Fail: {} ({:.1}% passed) | Duration: {}ms | Concurrency: {} (peak {})\n",
            summary.total,
            summary.passed,
            summary.failed,
            summary.pass_rate(),
            summary.duration_ms,
            summary.concurrency,
            summary.peak_in_flight
        ));

        output
    }

    fn green(&self, text: &str) -> String {
        if self.colorize {
            format!("\x1b[32m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.colorize {
            format!("\x1b[31m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Text)
    }
}

/// Captured stdout and stderr of a failed item, indented under its name
fn format_captured(result: &RunResult) -> String {
    let mut output = String::new();
    for (label, text) in [("stdout", &result.stdout), ("stderr", &result.stderr)] {
        if text.trim().is_empty() {
            continue;
        }
        output.push_str(&format!("    ── {label} ──\n"));
        for line in text.trim_end().lines() {
            output.push_str("    ");
            output.push_str(line);
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunOutcome, WorkItem};

    fn failing_summary() -> RunSummary {
        RunSummary::new(
            vec![
                RunResult::success(WorkItem::from("src/a.test.ts"), 10),
                RunResult::new(WorkItem::from("src/b.test.ts"), RunOutcome::failure(1), 20)
                    .with_output("1 assertion failed\n", "AssertionError: expected 2\n"),
                RunResult::launch_failed(WorkItem::from("src/c.test.ts"), "No such file"),
            ],
            2,
            2,
            40,
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TEXT"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_all_passed_text() {
        let summary = RunSummary::new(
            vec![RunResult::success(WorkItem::from("src/a.test.ts"), 10)],
            4,
            1,
            10,
        );
        let output = ResultFormatter::default().no_color().format_summary(&summary);
        assert!(output.starts_with("✔ All 1 test file(s) passed"));
        assert!(output.contains("Fail: 0 (100.0% passed)"));
    }

    #[test]
    fn test_failures_listed_with_captured_output() {
        let output = ResultFormatter::default()
            .no_color()
            .format_summary(&failing_summary());

        assert!(output.contains("2 test file(s) failed:"));
        assert!(output.contains("  ✖ src/b.test.ts  [FAIL (exit code 1)]"));
        assert!(output.contains("    AssertionError: expected 2"));
        assert!(output.contains("    1 assertion failed"));
        assert!(output.contains("  ✖ src/c.test.ts  [LAUNCH ERROR: No such file]"));
        assert!(!output.contains("src/a.test.ts"));
    }

    #[test]
    fn test_streamed_output_is_not_repeated() {
        let output = ResultFormatter::default()
            .no_color()
            .streamed(true)
            .format_summary(&failing_summary());

        assert!(output.contains("  ✖ src/b.test.ts"));
        assert!(!output.contains("AssertionError"));
    }

    #[test]
    fn test_json_summary() {
        let output = ResultFormatter::new(OutputFormat::Json).format_summary(&failing_summary());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["failed"], 2);
        assert_eq!(value["results"][2]["status"], "launch_failed");
    }
}
