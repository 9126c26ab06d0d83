//! Bounded work-conserving scheduler
//!
//! Dispatches work items in FIFO order, never keeping more than the
//! concurrency bound in flight, and starts the next queued item as soon as
//! any running item terminates. All run state is owned by the single
//! coordinating task inside [`Scheduler::run`]; the launched processes only
//! report back through their [`RunResult`].

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::launcher::Launcher;
use super::progress::Progress;
use crate::error::RunnerError;
use crate::models::{RunResult, RunSummary, WorkItem};

/// Concurrency-bounded test runner
pub struct Scheduler<L: Launcher> {
    launcher: Arc<L>,
    concurrency: usize,
    progress: Progress,
}

impl<L: Launcher> Scheduler<L> {
    /// Create a scheduler; a bound of 0 is raised to 1
    pub fn new(launcher: L, concurrency: usize) -> Self {
        Self {
            launcher: Arc::new(launcher),
            concurrency: concurrency.max(1),
            progress: Progress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every item to completion and aggregate the results
    pub async fn run(mut self, items: Vec<WorkItem>) -> Result<RunSummary, RunnerError> {
        if items.is_empty() {
            return Err(RunnerError::NoWorkItems {
                patterns: "<none submitted>".to_string(),
            });
        }

        warn_duplicates(&items);

        let start = Instant::now();
        let mut state = RunState::new(items);
        let mut tasks = JoinSet::new();

        info!(
            "Running {} test file(s) with concurrency limit {}",
            state.total, self.concurrency
        );

        while state.has_work() {
            self.fill(&mut state, &mut tasks);

            match tasks.join_next().await {
                Some(Ok((seq, result))) => {
                    state.record(seq, result)?;
                    if let Some(result) = state.results.get(&seq) {
                        self.progress
                            .finished(result, state.results.len(), state.total);
                    }
                }
                Some(Err(e)) => {
                    return Err(RunnerError::SchedulerFault(format!(
                        "test task did not complete: {e}"
                    )));
                }
                None => {
                    return Err(RunnerError::SchedulerFault(format!(
                        "{} item(s) in flight but no running tasks",
                        state.in_flight.len()
                    )));
                }
            }
        }

        self.progress.done();

        let duration_ms = start.elapsed().as_millis() as u64;
        let peak = state.peak_in_flight;
        let results: Vec<RunResult> = state.results.into_values().collect();
        let summary = RunSummary::new(results, self.concurrency, peak, duration_ms);

        info!(
            "Run completed in {}ms - Pass: {}/{} (peak concurrency {})",
            duration_ms, summary.passed, summary.total, peak
        );

        Ok(summary)
    }

    /// Dispatch queued items until the bound is reached or the queue is empty
    fn fill(&mut self, state: &mut RunState, tasks: &mut JoinSet<(usize, RunResult)>) {
        while state.in_flight.len() < self.concurrency {
            let Some((seq, item)) = state.queue.pop_front() else {
                break;
            };

            self.progress.started(&item, seq + 1, state.total);
            debug!("Dispatching #{} {}", seq + 1, item);

            let run = self.launcher.launch(item.clone());
            tasks.spawn(async move { (seq, run.await) });

            state.in_flight.insert(seq, item);
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight.len());
        }
    }
}

/// Mutable state of one run, owned by the coordinator
struct RunState {
    total: usize,
    queue: VecDeque<(usize, WorkItem)>,
    in_flight: HashMap<usize, WorkItem>,
    /// Keyed by dispatch sequence so duplicate identifiers keep separate results
    results: BTreeMap<usize, RunResult>,
    peak_in_flight: usize,
}

impl RunState {
    fn new(items: Vec<WorkItem>) -> Self {
        Self {
            total: items.len(),
            queue: items.into_iter().enumerate().collect(),
            in_flight: HashMap::new(),
            results: BTreeMap::new(),
            peak_in_flight: 0,
        }
    }

    fn has_work(&self) -> bool {
        !self.queue.is_empty() || !self.in_flight.is_empty()
    }

    fn record(&mut self, seq: usize, result: RunResult) -> Result<(), RunnerError> {
        if self.in_flight.remove(&seq).is_none() {
            return Err(RunnerError::SchedulerFault(format!(
                "completion for #{} which is not in flight",
                seq + 1
            )));
        }
        debug!("Finished #{} {}", seq + 1, result);
        if self.results.insert(seq, result).is_some() {
            return Err(RunnerError::SchedulerFault(format!(
                "result for #{} recorded twice",
                seq + 1
            )));
        }
        Ok(())
    }
}

fn warn_duplicates(items: &[WorkItem]) {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            warn!("{} is queued more than once; each run is reported separately", item);
        }
    }
}
