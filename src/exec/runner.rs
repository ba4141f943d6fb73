// src/exec/runner.rs

//! Spawn a process, drain both output streams concurrently, and collect a
//! complete [`ExecutionResult`].
//!
//! Each run owns three concurrent activities: a stdout drain, a stderr drain
//! and the wait on process exit. `run` returns only after all three are done,
//! so captured output is never truncated by an early return. Drains start
//! before anything waits on the child, which keeps either pipe from filling
//! while the other is idle.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{ProvisionError, Result};
use crate::exec::capture::Capture;
use crate::exec::request::{ExecutionRequest, ExecutionResult};
use crate::exec::sink::{LineSink, NullSink, Stream};

/// How long the drains may keep reading after a timed-out process group was
/// killed. Descendants that escaped the group can hold the pipes open.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

type SharedCapture = Arc<Mutex<Capture>>;

/// Runs external binaries and captures their output.
///
/// A runner holds no per-run state; one instance can serve any number of
/// concurrent `run` calls.
#[derive(Clone)]
pub struct ProcessRunner {
    sink: Arc<dyn LineSink>,
    max_capture_bytes: Option<usize>,
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("max_capture_bytes", &self.max_capture_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            sink: Arc::new(NullSink),
            max_capture_bytes: None,
        }
    }

    /// Forward every line to `sink` as it is read.
    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Keep only the most recent `limit` bytes per stream (`None` = keep all).
    pub fn with_capture_limit(mut self, limit: Option<usize>) -> Self {
        self.max_capture_bytes = limit;
        self
    }

    /// Run `request` to completion.
    ///
    /// - `Spawn` if the binary cannot be started.
    /// - `Timeout` (with partial output) if the request's deadline expires.
    /// - A nonzero exit is **not** an error here; it is reported in
    ///   `exit_code`.
    pub async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let started = Instant::now();
        info!(
            binary = %request.binary(),
            args = ?request.arg_list(),
            dir = ?request.dir(),
            timeout = ?request.deadline(),
            "starting process"
        );

        let mut child = spawn_child(request)?;
        let pid = child.id();

        let out_cap: SharedCapture = Arc::new(Mutex::new(Capture::with_limit(self.max_capture_bytes)));
        let err_cap: SharedCapture = Arc::new(Mutex::new(Capture::with_limit(self.max_capture_bytes)));

        let mut drains = JoinSet::new();
        drains.spawn(drain(
            child.stdout.take(),
            Stream::Stdout,
            Arc::clone(&out_cap),
            Arc::clone(&self.sink),
        ));
        drains.spawn(drain(
            child.stderr.take(),
            Stream::Stderr,
            Arc::clone(&err_cap),
            Arc::clone(&self.sink),
        ));

        let finished = match request.deadline() {
            None => Some(wait_all(&mut child, &mut drains).await),
            Some(limit) => tokio::time::timeout(limit, wait_all(&mut child, &mut drains))
                .await
                .ok(),
        };

        match finished {
            Some(outcome) => {
                let status = outcome?;
                let result = collect(status.code().unwrap_or(-1), &out_cap, &err_cap, started);
                info!(
                    binary = %request.binary(),
                    exit_code = result.exit_code,
                    success = result.success(),
                    duration_ms = result.duration.as_millis() as u64,
                    stdout_bytes = result.stdout.len(),
                    stderr_bytes = result.stderr.len(),
                    "process exited"
                );
                Ok(result)
            }
            None => {
                let limit = request.deadline().unwrap_or_default();
                warn!(
                    binary = %request.binary(),
                    timeout = ?limit,
                    "deadline exceeded; killing process group"
                );
                let exit_code = terminate(&mut child, pid).await;

                if tokio::time::timeout(DRAIN_GRACE, join_drains(&mut drains))
                    .await
                    .is_err()
                {
                    debug!(
                        binary = %request.binary(),
                        "output pipes still open after kill; abandoning drains"
                    );
                }
                drains.abort_all();

                let partial = collect(exit_code, &out_cap, &err_cap, started);
                Err(ProvisionError::Timeout {
                    binary: request.binary().to_string(),
                    timeout: limit,
                    partial: Box::new(partial),
                })
            }
        }
    }
}

fn spawn_child(request: &ExecutionRequest) -> Result<Child> {
    let mut cmd = Command::new(request.binary());
    cmd.args(request.arg_list())
        .envs(request.env_overlay())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = request.dir() {
        cmd.current_dir(dir);
    }

    // Own process group, so a timeout can take down every descendant.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|source| ProvisionError::Spawn {
        binary: request.binary().to_string(),
        source,
    })
}

/// Wait for exit and for both drains; all three proceed concurrently.
///
/// Cancel safe: dropping this future leaves the child and the remaining
/// drain tasks untouched.
async fn wait_all(child: &mut Child, drains: &mut JoinSet<io::Result<()>>) -> Result<ExitStatus> {
    let (status, drained) = tokio::join!(child.wait(), join_drains(drains));
    drained?;
    Ok(status?)
}

async fn join_drains(drains: &mut JoinSet<io::Result<()>>) -> Result<()> {
    while let Some(joined) = drains.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => return Err(anyhow!("output drain task failed: {e}").into()),
        }
    }
    Ok(())
}

/// Read one stream to end-of-stream, line by line, keeping raw bytes.
async fn drain<R>(
    reader: Option<R>,
    stream: Stream,
    capture: SharedCapture,
    sink: Arc<dyn LineSink>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut reader = BufReader::new(reader);

    loop {
        let mut buf = Vec::new();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        {
            let line = String::from_utf8_lossy(&buf);
            sink.line(stream, line.trim_end_matches(['\n', '\r']));
        }
        lock(&capture).push(buf);
    }

    debug!(%stream, "drain reached end of stream");
    Ok(())
}

/// Kill the child's process group (unix) and the child itself, then reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) -> i32 {
    #[cfg(unix)]
    if let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            debug!(pid, error = %e, "killpg failed; process group may already be gone");
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill after deadline failed; child may already be reaped");
    }

    match child.try_wait() {
        Ok(Some(status)) => status.code().unwrap_or(-1),
        _ => -1,
    }
}

fn collect(
    exit_code: i32,
    out_cap: &SharedCapture,
    err_cap: &SharedCapture,
    started: Instant,
) -> ExecutionResult {
    let out = lock(out_cap);
    let err = lock(err_cap);
    ExecutionResult {
        exit_code,
        stdout: out.to_text(),
        stderr: err.to_text(),
        duration: started.elapsed(),
        truncated: out.truncated() || err.truncated(),
    }
}

fn lock(capture: &SharedCapture) -> MutexGuard<'_, Capture> {
    match capture.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
