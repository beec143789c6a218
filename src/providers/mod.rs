//! Completion provider abstraction layer.
//!
//! Defines the [`CompletionProvider`] trait and the shared request/response
//! types used by provider implementations. One provider is implemented:
//! [`openai::OpenAiProvider`] against the `/v1/chat/completions` API.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod openai;

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// A single-turn completion request.
///
/// The report workflow always sends exactly one system persona plus one
/// user prompt, so the request carries those directly instead of a
/// conversation history.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System persona injected before the user prompt.
    pub system: String,
    /// The user prompt.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Token usage statistics for a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageStats {
    /// Tokens used in the prompt/input.
    pub input_tokens: u32,
    /// Tokens generated in the response.
    pub output_tokens: u32,
}

impl UsageStats {
    /// Total tokens consumed by the call.
    pub fn total_tokens(&self) -> u64 {
        u64::from(self.input_tokens).saturating_add(u64::from(self.output_tokens))
    }
}

/// The response from a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Generated text.
    pub text: String,
    /// Token usage for the accounting call site.
    pub usage: UsageStats,
    /// The model identifier that served this response.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by completion providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure (includes a configured timeout firing).
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitised response body.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// HTTP helpers (shared with the enrichment client)
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure, `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse, redact, and bound an upstream error body before it is stored
/// or logged.
///
/// Known credential shapes are replaced with `[REDACTED]` so an echo of a
/// request header never lands in the ledger, logs, or a user reply.
pub fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"sk-[A-Za-z0-9_\-]{20,}",
        r"Bearer [A-Za-z0-9_\-\.]{16,}",
        r"\b\d{6,10}:[A-Za-z0-9_\-]{30,}\b",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Core completion provider interface.
///
/// Implementations must be `Send + Sync` so the report pipeline can hold
/// one across async task boundaries.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a completion from the model.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on API, network, or parse failure.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    /// The model identifier string this provider is instantiated for.
    fn model_id(&self) -> &str;
}
