//! Chat-completion provider abstraction.
//!
//! The worker does not talk to the network directly; it goes through a
//! [`ChatProvider`]. The production implementation is the HTTP client in
//! [`http`]; tests inject a mock. This keeps the worker's contract (one
//! call in, one envelope out) independent of any particular service.

mod http;

pub use http::HttpChatProvider;

use async_trait::async_trait;
use thiserror::Error;

/// A single-shot chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one prompt and return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Failures of the upstream chat call.
///
/// Every variant here ends up *inside* a `FAILED` envelope; none of them
/// escapes the worker as a process-level fault.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The service could not be reached (DNS, refused, network timeout).
    #[error("connection to chat service failed: {0}")]
    Connection(String),

    /// The service rejected the credentials.
    #[error("chat service rejected credentials: {0}")]
    AuthRejected(String),

    /// The service rejected the request (quota, policy, bad payload).
    #[error("chat service rejected request (http {status}): {detail}")]
    Rejected {
        /// Upstream HTTP status code.
        status: u16,
        /// Error detail, from the response body when one was readable.
        detail: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response from chat service: {0}")]
    MalformedResponse(String),

    /// A well-formed response that contained no completion.
    #[error("chat service returned no completion choices")]
    EmptyCompletion,

    /// The configured API key cannot be sent as an HTTP header.
    #[error("api key is not a valid header value")]
    InvalidApiKey,
}
