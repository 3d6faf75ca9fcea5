//! External test runner adapter.
//!
//! [`ProcessRunner`] spawns the configured runner command inside a workspace, merges its
//! stdout and stderr into one capped buffer, and enforces a timeout. A run that times out or is
//! cancelled has its whole process group stopped (SIGTERM, then SIGKILL after a grace period).

use crate::error::{JudgeError, JudgeResult};
use crate::model::config::RunnerConfig;
use crate::model::ExecutionOutcome;
use crate::workspace::Workspace;
#[cfg(unix)]
use nix::sys::signal::{killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Poll interval while waiting on the runner process.
const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long to wait for the process to be reaped after SIGKILL.
const KILL_REAP_TIMEOUT: Duration = Duration::from_millis(200);
/// Minimum time given to the pipe readers to drain after the runner exits.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);
/// Size of each read from the child's pipes.
const READ_CHUNK: usize = 8 * 1024;

/// Environment variable carrying the remote browser endpoint to the runner.
pub const ENDPOINT_ENV: &str = "PW_TEST_CONNECT_WS_ENDPOINT";

/// Anything that can execute a prepared workspace.
///
/// Implementations must not panic or return early without an outcome: every failure becomes
/// [`ExecutionOutcome::Errored`].
pub trait TestRunner: Send + Sync {
    fn run(&self, workspace: &Workspace) -> ExecutionOutcome;
}

/// Shared flag used to stop an in-flight run from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
enum WaitResult {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
    Failed(std::io::Error),
}

/// Merged, size-capped capture of the runner's output.
#[derive(Debug)]
struct OutputBuffer {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl OutputBuffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            truncated: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend(chunk.iter().take(room));
    }

    fn text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            text.push_str(&format!(
                "\n[output truncated after {} bytes]",
                self.limit
            ));
        }
        text
    }
}

/// Runs the configured command as a child process.
#[derive(Debug)]
pub struct ProcessRunner {
    config: RunnerConfig,
    cancel: CancellationToken,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop runs when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Substitute `{config}`, `{source}` and `{dir}` in the configured arguments.
    #[must_use]
    pub fn resolve_args(&self, workspace: &Workspace) -> Vec<String> {
        let config = workspace.config_path.display().to_string();
        let source = workspace.source_path.display().to_string();
        let dir = workspace.dir.display().to_string();
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{config}", &config)
                    .replace("{source}", &source)
                    .replace("{dir}", &dir)
            })
            .collect()
    }

    fn build_command(&self, workspace: &Workspace) -> Command {
        let mut command = Command::new(&self.config.command);
        command
            .args(self.resolve_args(workspace))
            .current_dir(&workspace.dir)
            .env("CI", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(endpoint) = self.config.endpoint.as_deref() {
            command.env(ENDPOINT_ENV, endpoint);
        }
        command.envs(&self.config.env);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    }

    fn spawn(&self, workspace: &Workspace) -> JudgeResult<Child> {
        self.build_command(workspace).spawn().map_err(|err| {
            JudgeError::process(
                format!("failed to start runner `{}`: {err}", self.config.command),
                err,
            )
        })
    }

    fn wait(&self, child: &mut Child, timeout: Duration) -> WaitResult {
        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return WaitResult::Exited(status),
                Ok(None) => {
                    if self.cancel.is_cancelled() {
                        return WaitResult::Cancelled;
                    }
                    if Instant::now() >= deadline {
                        return WaitResult::TimedOut;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return WaitResult::Failed(err),
            }
        }
    }
}

impl TestRunner for ProcessRunner {
    fn run(&self, workspace: &Workspace) -> ExecutionOutcome {
        let started = Instant::now();
        let mut child = match self.spawn(workspace) {
            Ok(child) => child,
            Err(err) => {
                warn!(
                    execution_id = %workspace.execution_id,
                    command = %self.config.command,
                    error = %err,
                    "failed to start runner"
                );
                return ExecutionOutcome::Errored {
                    message: err.to_string(),
                };
            }
        };
        info!(
            execution_id = %workspace.execution_id,
            command = %self.config.command,
            pid = child.id(),
            "runner started"
        );

        #[allow(clippy::cast_possible_truncation)]
        let limit = self.config.max_output_bytes.min(usize::MAX as u64) as usize;
        let output = Arc::new(Mutex::new(OutputBuffer::new(limit)));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, Arc::clone(&output)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, Arc::clone(&output)));
        }

        let grace = Duration::from_millis(self.config.kill_grace_ms);
        let result = self.wait(&mut child, Duration::from_millis(self.config.timeout_ms));
        if !matches!(result, WaitResult::Exited(_)) {
            stop_child(&mut child, grace);
        }
        join_readers(readers, grace.max(READER_DRAIN_TIMEOUT));

        let captured = output
            .lock()
            .map(|buffer| buffer.text())
            .unwrap_or_default();
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            WaitResult::Exited(status) => {
                info!(
                    execution_id = %workspace.execution_id,
                    exit_code = ?status.code(),
                    duration_ms = elapsed_ms,
                    "runner finished"
                );
                ExecutionOutcome::Ran {
                    exit_success: status.success(),
                    raw_output: captured,
                }
            }
            WaitResult::TimedOut => {
                warn!(
                    execution_id = %workspace.execution_id,
                    timeout_ms = self.config.timeout_ms,
                    "runner timed out"
                );
                ExecutionOutcome::Errored {
                    message: with_note(
                        &captured,
                        &format!(
                            "Runner timed out after {} ms and was stopped.",
                            self.config.timeout_ms
                        ),
                    ),
                }
            }
            WaitResult::Cancelled => {
                warn!(execution_id = %workspace.execution_id, "runner cancelled");
                ExecutionOutcome::Errored {
                    message: with_note(&captured, "Run cancelled; the runner was stopped."),
                }
            }
            WaitResult::Failed(err) => {
                warn!(
                    execution_id = %workspace.execution_id,
                    error = %err,
                    "failed to wait for runner"
                );
                ExecutionOutcome::Errored {
                    message: with_note(&captured, &format!("failed to wait for runner: {err}")),
                }
            }
        }
    }
}

fn with_note(captured: &str, note: &str) -> String {
    if captured.trim().is_empty() {
        note.to_string()
    } else {
        format!("{captured}\n\n{note}")
    }
}

fn spawn_reader<R>(mut pipe: R, output: Arc<Mutex<OutputBuffer>>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if let Ok(mut buffer) = output.lock() {
                        buffer.push(chunk.get(..n).unwrap_or_default());
                    }
                }
            }
        }
    })
}

/// Join reader threads, giving up after `timeout` if a leftover grandchild keeps a pipe open.
fn join_readers(readers: Vec<JoinHandle<()>>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    for reader in readers {
        while !reader.is_finished() && Instant::now() < deadline {
            std::thread::sleep(POLL_INTERVAL);
        }
        if reader.is_finished() {
            let _ = reader.join();
        }
    }
}

/// SIGTERM the process group, wait `grace`, then SIGKILL.
fn stop_child(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        // Process IDs are always positive and fit in i32
        #[allow(clippy::cast_possible_wrap)]
        let pgid = Pid::from_raw(child.id() as i32);
        signal_process_group(pgid, Signal::SIGTERM);
        if wait_for_exit(child, grace).is_some() {
            return;
        }
        signal_process_group(pgid, Signal::SIGKILL);
        let _ = wait_for_exit(child, KILL_REAP_TIMEOUT);
    }
    #[cfg(not(unix))]
    {
        let _ = grace;
        let _ = child.kill();
        let _ = wait_for_exit(child, KILL_REAP_TIMEOUT);
    }
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => std::thread::sleep(POLL_INTERVAL),
            Ok(None) | Err(_) => return None,
        }
    }
}

#[cfg(unix)]
fn signal_process_group(pgid: Pid, signal: Signal) {
    match killpg(pgid, signal) {
        // ESRCH means the group is already gone
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(err) => warn!(pgid = pgid.as_raw(), ?signal, error = %err, "failed to signal runner"),
    }
}
