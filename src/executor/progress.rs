//! Progress reporting
//!
//! Display only. Quiet runs rewrite a single status line; verbose runs print
//! one line per start and finish event.

use std::io::Write;
use std::time::Duration;

use crate::models::{RunResult, WorkItem};

/// Width the single status line is padded to so shorter messages overwrite longer ones
const LINE_WIDTH: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressMode {
    /// Single carriage-return line
    Line,
    /// One line per event with timing
    Verbose,
    /// No output
    Hidden,
}

/// Progress reporter owned by the scheduler
#[derive(Debug)]
pub struct Progress {
    mode: ProgressMode,
    colorize: bool,
    dirty: bool,
}

impl Progress {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            mode,
            colorize: true,
            dirty: false,
        }
    }

    pub fn hidden() -> Self {
        Self::new(ProgressMode::Hidden)
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Report that an item was dispatched
    pub fn started(&mut self, item: &WorkItem, started: usize, total: usize) {
        match self.mode {
            ProgressMode::Line => {
                let line = format_line(&format!("Test {started}/{total}: {item}"));
                self.write_line(&line);
            }
            ProgressMode::Verbose => {
                println!("▶ [{started}/{total}] {item}");
            }
            ProgressMode::Hidden => {}
        }
    }

    /// Report that an item terminated
    pub fn finished(&mut self, result: &RunResult, completed: usize, total: usize) {
        match self.mode {
            ProgressMode::Line => {
                let line = format_line(&format!("Completed {completed}/{total} tests"));
                self.write_line(&line);
            }
            ProgressMode::Verbose => {
                println!(
                    "{} [{completed}/{total}]",
                    format_finish(result, self.colorize)
                );
            }
            ProgressMode::Hidden => {}
        }
    }

    /// Terminate the status line before the summary is printed
    pub fn done(&mut self) {
        if self.mode == ProgressMode::Line && self.dirty {
            println!("\n");
            self.dirty = false;
        }
    }

    fn write_line(&mut self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // Progress is cosmetic; a closed stdout must not fail the run.
        let _ = write!(stdout, "{line}");
        let _ = stdout.flush();
        self.dirty = true;
    }
}

/// Carriage-return prefixed line padded to the status width
pub fn format_line(message: &str) -> String {
    let padding = LINE_WIDTH.saturating_sub(message.chars().count());
    format!("\r{message}{}", " ".repeat(padding))
}

/// Verbose finish line: symbol, item, outcome and duration
pub fn format_finish(result: &RunResult, colorize: bool) -> String {
    let duration = format_duration(Duration::from_millis(result.duration_ms));
    let text = format!(
        "{} {} {} ({duration})",
        result.outcome.symbol(),
        result.item,
        result.outcome
    );

    if !colorize {
        return text;
    }
    if result.is_success() {
        format!("\x1b[32m{text}\x1b[0m")
    } else {
        format!("\x1b[31m{text}\x1b[0m")
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
