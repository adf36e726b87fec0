//! Bridge-specific error types.

use std::io;
use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while dispatching a request through the worker.
///
/// An upstream failure (the network call itself) is *not* represented here:
/// the worker reports it in-band as a `FAILED` envelope, and the launcher
/// hands that back as ordinary data. These variants cover the bridge layer
/// only.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The worker process could not be created. Also covers the case where
    /// no worker binary could be located.
    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(#[source] io::Error),

    /// The worker did not exit within the allotted duration and was killed.
    #[error("worker did not exit within {timeout_secs} seconds")]
    Timeout {
        /// The timeout that expired.
        timeout_secs: u64,
        /// Stderr captured before the worker was killed.
        diagnostics: String,
    },

    /// The worker exited but its stdout did not contain a valid envelope.
    ///
    /// This is a worker contract violation (an unhandled fault in the
    /// worker, or a stray print corrupting the result channel), surfaced
    /// as-is and never retried.
    #[error("worker produced no parsable result: {reason}")]
    MalformedResult {
        /// Why decoding failed.
        reason: String,
        /// The raw stdout content, for troubleshooting.
        raw: String,
        /// Stderr captured from the worker.
        diagnostics: String,
    },

    /// Failed to drain the worker's output pipes or wait for its exit.
    #[error("failed to collect worker output: {0}")]
    ReadFailed(#[source] io::Error),

    /// The request text was empty. Caught before any process is spawned.
    #[error("request text must not be empty")]
    EmptyRequest,
}

impl BridgeError {
    /// Captured stderr from the worker, when a process got far enough to
    /// produce any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Timeout { diagnostics, .. } | Self::MalformedResult { diagnostics, .. } => {
                Some(diagnostics.as_str())
            }
            _ => None,
        }
    }

    /// Whether this error means the worker never ran at all.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::SpawnFailed(_) | Self::EmptyRequest)
    }
}
