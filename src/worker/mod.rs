//! Worker-side implementation of the bridge.
//!
//! The worker's contract is strict: exactly one [`Envelope`] line on
//! stdout per invocation, exit code 0 whether the upstream call succeeded
//! or not. Status travels in-band; stderr carries diagnostics only. An
//! unhandled fault here would leave the launcher with an empty result
//! channel, so every failure path is folded into a `FAILED` envelope
//! before it can escape.

use std::io::Write;
use std::time::Duration;

use reqwest::Client;

use crate::bridge::Envelope;
use crate::chat::{ChatError, ChatProvider, HttpChatProvider};
use crate::config::{Settings, SettingsError};

/// Emergency record used when envelope encoding itself fails. Keeps the
/// stdout contract intact even then.
const FALLBACK_ENVELOPE: &str = r#"{"status":"FAILED","msg":"internal error: envelope encoding failed"}"#;

/// Failures while preparing the provider, before any network call.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("provider setup failed: {0}")]
    Chat(#[from] ChatError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Perform one chat-completion call and fold the outcome into an envelope.
pub async fn serve(provider: &dyn ChatProvider, request: &str) -> Envelope {
    match provider.complete(request).await {
        Ok(text) => Envelope::success(text),
        Err(e) => {
            tracing::error!("chat completion failed: {e}");
            Envelope::failed(format!("chat completion request failed: {e}"))
        }
    }
}

/// Full worker run: resolve configuration, build the HTTP provider, make
/// the call. Configuration faults become `FAILED` envelopes like any
/// other failure.
pub async fn run(request: &str) -> Envelope {
    if request.is_empty() {
        return Envelope::failed("request text must not be empty");
    }

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("could not load settings: {e}");
            return Envelope::failed(format!("configuration error: {e}"));
        }
    };

    let provider = match build_provider(&settings) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("could not set up chat provider: {e}");
            return Envelope::failed(e.to_string());
        }
    };

    serve(&provider, request).await
}

/// Build the HTTP provider from resolved settings.
pub fn build_provider(settings: &Settings) -> Result<HttpChatProvider, SetupError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(settings.api.connect_timeout_secs))
        .build()?;

    let provider = match settings.api.resolved_api_key()? {
        Some(key) => {
            HttpChatProvider::bearer(client, &key, &settings.api.endpoint, &settings.api.model)?
        }
        None => HttpChatProvider::no_auth(client, &settings.api.endpoint, &settings.api.model),
    };
    Ok(provider)
}

/// Write the envelope as one line on `out`.
///
/// If encoding fails, a hand-built constant record goes out instead, so
/// the launcher always finds valid JSON on the result channel.
pub fn emit<W: Write>(out: &mut W, envelope: &Envelope) {
    let line = envelope.encode().unwrap_or_else(|e| {
        tracing::error!("failed to encode envelope: {e}");
        FALLBACK_ENVELOPE.to_string()
    });
    if let Err(e) = writeln!(out, "{line}") {
        tracing::error!("failed to write envelope to stdout: {e}");
    }
}
