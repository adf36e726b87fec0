//! Host-side launcher: spawns the worker and decodes its result.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use super::envelope::Envelope;
use super::error::{BridgeError, BridgeResult};
use crate::config::Settings;

/// Default timeout for one dispatch (60 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A decoded worker result plus the captured diagnostic channel.
///
/// A `FAILED` envelope is ordinary data here, not an error: the worker ran
/// and reported its outcome in-band. Bridge-layer failures are
/// [`BridgeError`]s instead.
#[derive(Debug)]
pub struct Reply {
    /// The envelope the worker emitted on stdout.
    pub envelope: Envelope,
    /// Everything the worker wrote to stderr. Never parsed, only shown.
    pub diagnostics: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.envelope.is_success()
    }

    /// The response text or failure description.
    pub fn message(&self) -> &str {
        &self.envelope.msg
    }
}

/// Spawns one worker process per request and supervises it to completion.
///
/// The worker receives the request text as its sole argument and must write
/// exactly one [`Envelope`] line to stdout. The launcher blocks (at its
/// await points) until the worker exits or the timeout expires, whichever
/// comes first; on timeout the worker is killed.
///
/// Each dispatch is independent: the launcher holds no state between calls
/// and concurrent dispatches never share a process.
///
/// # Example
///
/// ```ignore
/// use courier::bridge::Launcher;
///
/// let launcher = Launcher::new("./courier-worker")
///     .with_timeout(Duration::from_secs(30));
/// let reply = launcher.dispatch("Tell me about CNC milling").await?;
/// println!("{}", reply.message());
/// ```
#[derive(Debug, Clone)]
pub struct Launcher {
    /// Path to the worker binary.
    worker: PathBuf,

    /// How long one dispatch may take before the worker is killed.
    timeout: Duration,

    /// Replacement environment for the child. `None` inherits the host
    /// environment; `Some` clears it and sets exactly these variables, for
    /// hosts whose injected paths must not leak into the worker.
    env: Option<BTreeMap<String, String>>,
}

impl Launcher {
    /// Create a launcher for the worker binary at `worker`.
    pub fn new(worker: impl Into<PathBuf>) -> Self {
        Self {
            worker: worker.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env: None,
        }
    }

    /// Create a launcher from settings, resolving the worker binary path.
    ///
    /// # Errors
    ///
    /// Returns `SpawnFailed` if no worker binary could be located.
    pub fn from_settings(settings: &Settings) -> BridgeResult<Self> {
        let worker = resolve_worker_path(settings)?;
        let mut launcher =
            Self::new(worker).with_timeout(Duration::from_secs(settings.worker.timeout_secs));
        if let Some(env) = &settings.worker.env {
            launcher.env = Some(env.clone());
        }
        Ok(launcher)
    }

    /// Set the dispatch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the child environment with exactly `env`.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// The configured dispatch timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The worker binary this launcher will spawn.
    pub fn worker_path(&self) -> &Path {
        &self.worker
    }

    /// Dispatch one request through the worker.
    ///
    /// # Errors
    ///
    /// - `EmptyRequest` if `request` is empty.
    /// - `SpawnFailed` if the worker could not be started.
    /// - `Timeout` if the worker did not exit in time (it is killed).
    /// - `MalformedResult` if stdout held no valid envelope.
    /// - `ReadFailed` if draining the pipes or waiting failed.
    pub async fn dispatch(&self, request: &str) -> BridgeResult<Reply> {
        if request.is_empty() {
            return Err(BridgeError::EmptyRequest);
        }

        let mut command = Command::new(&self.worker);
        command
            .arg(request)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(env) = &self.env {
            command.env_clear().envs(env);
        }

        let mut child = command.spawn().map_err(BridgeError::SpawnFailed)?;

        let mut stdout = child.stdout.take().expect("stdout not captured");
        let mut stderr = child.stderr.take().expect("stderr not captured");

        // Drain both pipes concurrently while waiting, so a chatty worker
        // cannot deadlock against a full pipe buffer.
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let read = stdout.read_to_end(&mut buf).await;
            read.map(|_| buf)
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let read = stderr.read_to_end(&mut buf).await;
            read.map(|_| buf)
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(BridgeError::ReadFailed(e)),
            Err(_) => {
                // Timeout expired: this is the only cancellation path, and
                // it is forcible. Kill, then salvage whatever stderr the
                // worker managed to produce.
                if let Err(e) = child.kill().await {
                    tracing::warn!("failed to kill timed-out worker: {e}");
                }
                let diagnostics = collect_lossy(stderr_task.await);
                drop(stdout_task);
                return Err(BridgeError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                    diagnostics,
                });
            }
        };

        let stdout_buf = stdout_task.await.map_err(join_to_io)?.map_err(BridgeError::ReadFailed)?;
        let stderr_buf = stderr_task.await.map_err(join_to_io)?.map_err(BridgeError::ReadFailed)?;

        decode_reply(&stdout_buf, &stderr_buf, &status.to_string())
    }
}

/// Decode the worker's captured output into a [`Reply`].
///
/// The exit status is never used to decide success or failure; the envelope
/// carries that in-band. Its rendered form only enriches the error text
/// when decoding fails.
fn decode_reply(stdout: &[u8], stderr: &[u8], status: &str) -> BridgeResult<Reply> {
    let raw = String::from_utf8_lossy(stdout);
    let diagnostics = String::from_utf8_lossy(stderr).into_owned();

    let line = raw.trim();
    if line.is_empty() {
        return Err(BridgeError::MalformedResult {
            reason: format!("worker wrote nothing to stdout ({status})"),
            raw: raw.into_owned(),
            diagnostics,
        });
    }

    match Envelope::decode(line) {
        Ok(envelope) => Ok(Reply {
            envelope,
            diagnostics,
        }),
        Err(e) => Err(BridgeError::MalformedResult {
            reason: format!("invalid envelope ({status}): {e}"),
            raw: raw.into_owned(),
            diagnostics,
        }),
    }
}

fn collect_lossy(joined: Result<std::io::Result<Vec<u8>>, tokio::task::JoinError>) -> String {
    match joined {
        Ok(Ok(buf)) => String::from_utf8_lossy(&buf).into_owned(),
        _ => String::new(),
    }
}

fn join_to_io(e: tokio::task::JoinError) -> BridgeError {
    BridgeError::ReadFailed(std::io::Error::other(e))
}

/// Resolve the worker binary path.
///
/// Order: configured path, sibling of the current executable, conventional
/// candidates relative to the working directory, then a `PATH` probe.
pub fn resolve_worker_path(settings: &Settings) -> BridgeResult<PathBuf> {
    if let Some(path) = settings.worker.resolved_path() {
        return Ok(path);
    }

    // A companion binary normally installs next to the host one.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(WORKER_BINARY);
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }

    let candidates = [
        WORKER_BINARY,
        "./courier-worker",
        "./target/release/courier-worker",
        "./target/debug/courier-worker",
    ];
    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg(WORKER_BINARY).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
    }

    Err(BridgeError::SpawnFailed(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "worker binary not found; set worker.path in courier.toml or install courier-worker on PATH",
    )))
}

/// Conventional name of the worker binary.
pub const WORKER_BINARY: &str = "courier-worker";
