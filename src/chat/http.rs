//! HTTP chat-completion client (OpenAI-compatible wire format).

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatError, ChatProvider};
use async_trait::async_trait;

/// Longest error-body excerpt carried into a failure message.
const ERROR_DETAIL_LIMIT: usize = 500;

/// Chat-completion client for OpenAI-compatible endpoints.
///
/// Takes a pre-built [`Client`] so the embedder controls connection
/// settings; headers are assembled once at construction.
#[derive(Debug, Clone)]
pub struct HttpChatProvider {
    client: Client,
    headers: HeaderMap,
    endpoint: String,
    model: String,
}

impl HttpChatProvider {
    /// Client authenticating with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidApiKey` if the key cannot be encoded as a header
    /// value.
    pub fn bearer(
        client: Client,
        key: &str,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let mut headers = base_headers();
        let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ChatError::InvalidApiKey)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        Ok(Self {
            client,
            headers,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    /// Client for endpoints that take no credentials (local models).
    pub fn no_auth(client: Client, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            headers: base_headers(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let detail = read_error_detail(response).await;
            return Err(match status.as_u16() {
                401 | 403 => ChatError::AuthRejected(detail),
                code => ChatError::Rejected {
                    status: code,
                    detail,
                },
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::EmptyCompletion)
    }
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn classify_transport(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Connection(format!("request timed out: {e}"))
    } else {
        ChatError::Connection(e.to_string())
    }
}

/// Pull a readable detail string out of an upstream error response.
///
/// OpenAI-style bodies carry `{"error": {"message": ...}}`; anything else
/// is excerpted raw.
async fn read_error_detail(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error.message,
            Err(_) => excerpt(&text),
        },
        Err(_) => "(unreadable error body)".to_string(),
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(empty error body)".to_string();
    }
    let mut out: String = trimmed.chars().take(ERROR_DETAIL_LIMIT).collect();
    if out.len() < trimmed.len() {
        out.push_str("...");
    }
    out
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
