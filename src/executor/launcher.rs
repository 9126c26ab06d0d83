//! Work item launcher
//!
//! Spawns one isolated child process per work item, drains both pipes
//! concurrently and turns the exit status into a [`RunOutcome`].

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CommandConfig;
use crate::models::{RunOutcome, RunResult, WorkItem};

/// How long pipes may stay open after a timed-out child was killed
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Starts a work item and resolves once it has terminated
pub trait Launcher: Send + Sync + 'static {
    fn launch(&self, item: WorkItem) -> BoxFuture<'static, RunResult>;
}

/// Launch settings shared by every process of a run
#[derive(Clone, Debug)]
struct ProcessSpec {
    runner: CommandConfig,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    verbose: bool,
    colorize: bool,
}

/// Launcher running `runner.program runner.args... <item>` as a child process
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    spec: Arc<ProcessSpec>,
}

impl ProcessLauncher {
    pub fn new(runner: CommandConfig) -> Self {
        Self {
            spec: Arc::new(ProcessSpec {
                runner,
                env: BTreeMap::new(),
                timeout: None,
                verbose: false,
                colorize: true,
            }),
        }
    }

    fn spec_mut(&mut self) -> &mut ProcessSpec {
        Arc::make_mut(&mut self.spec)
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.spec_mut().env = env;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.spec_mut().timeout = timeout;
        self
    }

    /// Stream stdout live instead of only buffering it
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.spec_mut().verbose = verbose;
        self
    }

    pub fn no_color(mut self) -> Self {
        self.spec_mut().colorize = false;
        self
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, item: WorkItem) -> BoxFuture<'static, RunResult> {
        run_process(self.spec.clone(), item).boxed()
    }
}

/// Where a drained pipe is forwarded to while it is captured
#[derive(Clone, Copy, Debug)]
enum Forward {
    None,
    Stdout,
    StderrRed,
    Stderr,
}

async fn run_process(spec: Arc<ProcessSpec>, item: WorkItem) -> RunResult {
    let start = Instant::now();

    let mut cmd = Command::new(&spec.runner.program);
    cmd.args(&spec.runner.args)
        .arg(item.path())
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to launch {} for {}: {}", spec.runner.program, item, e);
            return RunResult::launch_failed(
                item,
                format!("failed to spawn `{}`: {e}", spec.runner.display()),
            );
        }
    };
    debug!("Spawned pid {:?} for {}", child.id(), item);

    let stdout_forward = if spec.verbose {
        Forward::Stdout
    } else {
        Forward::None
    };
    let stderr_forward = if spec.colorize {
        Forward::StderrRed
    } else {
        Forward::Stderr
    };
    let stdout_pump = child
        .stdout
        .take()
        .map(|out| tokio::spawn(pump(out, stdout_forward)));
    let stderr_pump = child
        .stderr
        .take()
        .map(|err| tokio::spawn(pump(err, stderr_forward)));

    let (status, timed_out) = match spec.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => (status, None),
            Err(_) => {
                warn!("{} exceeded {}s, killing it", item, limit.as_secs());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", item, e);
                }
                (child.wait().await, Some(limit))
            }
        },
        None => (child.wait().await, None),
    };

    let grace = timed_out.map(|_| PIPE_DRAIN_GRACE);
    let stdout = collect(stdout_pump, grace).await;
    let stderr = collect(stderr_pump, grace).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let outcome = match (timed_out, status) {
        (Some(limit), _) => RunOutcome::TimedOut {
            after_secs: limit.as_secs(),
        },
        (None, Ok(status)) => outcome_from_status(status),
        (None, Err(e)) => {
            warn!("Failed to wait for {}: {}", item, e);
            RunOutcome::Failure {
                code: None,
                signal: None,
            }
        }
    };

    RunResult::new(item, outcome, duration_ms).with_output(stdout, stderr)
}

/// Map an exit status onto an explicit outcome
pub fn outcome_from_status(status: ExitStatus) -> RunOutcome {
    if status.success() {
        return RunOutcome::Success;
    }
    RunOutcome::Failure {
        code: status.code(),
        signal: exit_signal(status),
    }
}

#[cfg(unix)]
fn exit_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// Read a pipe to the end, forwarding each chunk as soon as it arrives
async fn pump<R>(mut reader: R, forward: Forward) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let chunk = &buf[..n];
        captured.extend_from_slice(chunk);

        // Forwarding is best effort; capture continues if the terminal goes away.
        match forward {
            Forward::None => {}
            Forward::Stdout => {
                let mut out = tokio::io::stdout();
                let _ = out.write_all(chunk).await;
                let _ = out.flush().await;
            }
            Forward::Stderr => {
                let mut err = tokio::io::stderr();
                let _ = err.write_all(chunk).await;
            }
            Forward::StderrRed => {
                let mut err = tokio::io::stderr();
                let mut colored = Vec::with_capacity(chunk.len() + 9);
                colored.extend_from_slice(b"\x1b[31m");
                colored.extend_from_slice(chunk);
                colored.extend_from_slice(b"\x1b[0m");
                let _ = err.write_all(&colored).await;
            }
        }
    }

    Ok(captured)
}

async fn collect(
    pump: Option<JoinHandle<io::Result<Vec<u8>>>>,
    grace: Option<Duration>,
) -> String {
    let Some(mut handle) = pump else {
        return String::new();
    };

    let joined = match grace {
        Some(grace) => match tokio::time::timeout(grace, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // A grandchild may still hold the pipe open.
                handle.abort();
                return String::new();
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => {
            warn!("Failed to read child output: {}", e);
            String::new()
        }
        Err(e) => {
            warn!("Output reader task failed: {}", e);
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessLauncher {
        ProcessLauncher::new(CommandConfig::new("sh").arg("-c").arg(script).arg("sh")).no_color()
    }

    #[tokio::test]
    async fn test_successful_process_captures_stdout() {
        let launcher = sh("echo hello from $1");
        let result = launcher.launch(WorkItem::from("a.test.ts")).await;

        assert_eq!(result.outcome, RunOutcome::Success);
        assert_eq!(result.stdout.trim(), "hello from a.test.ts");
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_failing_process_records_code_and_stderr() {
        let launcher = sh("echo broken >&2; exit 3");
        let result = launcher.launch(WorkItem::from("b.test.ts")).await;

        assert_eq!(result.outcome, RunOutcome::failure(3));
        assert_eq!(result.stderr.trim(), "broken");
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let launcher = ProcessLauncher::new(CommandConfig::new("testpool-no-such-runner"));
        let result = launcher.launch(WorkItem::from("c.test.ts")).await;

        match &result.outcome {
            RunOutcome::LaunchFailed { message } => {
                assert!(message.contains("testpool-no-such-runner"));
            }
            other => panic!("expected launch failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_env_is_passed_to_child() {
        let mut env = BTreeMap::new();
        env.insert("deepkit_test_mode".to_string(), "true".to_string());
        let launcher = sh("echo $deepkit_test_mode").with_env(env);

        let result = launcher.launch(WorkItem::from("d.test.ts")).await;
        assert_eq!(result.stdout.trim(), "true");
    }

    #[tokio::test]
    async fn test_large_output_does_not_block() {
        // Well past a typical 64 KiB pipe buffer on both streams.
        let launcher = sh("i=0; while [ $i -lt 4000 ]; do echo 0123456789012345678901234567890123456789; echo e >&2; i=$((i+1)); done");
        let result = launcher.launch(WorkItem::from("e.test.ts")).await;

        assert!(result.is_success());
        assert_eq!(result.stdout.lines().count(), 4000);
        assert_eq!(result.stderr.lines().count(), 4000);
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let launcher = sh("sleep 30").with_timeout(Some(Duration::from_millis(200)));
        let result = launcher.launch(WorkItem::from("f.test.ts")).await;

        assert!(matches!(result.outcome, RunOutcome::TimedOut { .. }));
        assert!(result.duration_ms < 10_000);
    }
}
