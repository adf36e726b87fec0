//! The result record exchanged between the worker and the launcher.
//!
//! The worker writes exactly one envelope, as a single line of JSON, to its
//! stdout. Everything else the worker has to say goes to stderr. The schema
//! is closed: two keys, `status` and `msg`, and nothing else.

use serde::{Deserialize, Serialize};

/// Outcome tag carried in the envelope.
///
/// Wire values are `"SUCCESS"` and `"FAILED"`. There is no third state: a
/// worker that cannot even fail cleanly produces no envelope at all, which
/// the launcher reports as [`MalformedResult`](super::BridgeError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// The single result record a worker invocation produces.
///
/// `msg` holds the response text on success, or a human-readable failure
/// description (including cause detail) otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Whether the upstream call succeeded.
    pub status: Status,
    /// Response text or failure description.
    pub msg: String,
}

impl Envelope {
    /// Build a `SUCCESS` envelope carrying the response text.
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            msg: msg.into(),
        }
    }

    /// Build a `FAILED` envelope carrying a failure description.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            msg: msg.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Encode as the single-line wire form.
    ///
    /// JSON escaping keeps embedded newlines out of the physical line, so
    /// one envelope always occupies exactly one line on the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode one wire line back into an envelope.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}
