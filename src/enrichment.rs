//! Web enrichment via the Brave web search API.
//!
//! One outbound query per report, capped at [`RESULT_CAP`] snippets. Each
//! call is bounded by a fixed 20-second ceiling covering the whole request.
//! No retry: a non-success status fails the request that triggered it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SEARCH_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Fixed ceiling on the whole search call.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum snippets requested from, and accepted back from, the provider.
pub const RESULT_CAP: usize = 5;

/// A single search result passed through to the synthesis prompt unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSnippet {
    /// Result title.
    #[serde(default)]
    pub title: String,
    /// Result URL.
    #[serde(default)]
    pub url: String,
    /// Result description text.
    #[serde(default)]
    pub description: String,
}

/// Errors from the web enrichment client.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// HTTP transport failure (includes the 20-second ceiling firing).
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream provider responded with an error status.
    #[error("search provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitised response body.
        body: String,
    },
    /// Response did not match the expected schema.
    #[error("search response parse error: {0}")]
    Parse(String),
}

/// Web search interface.
///
/// Implementations must be `Send + Sync` so the report pipeline can hold
/// one across await points.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one web search and return at most [`RESULT_CAP`] snippets in
    /// provider order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, status, or parse failure.
    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, SearchError>;
}

// ---------------------------------------------------------------------------
// Wire types (pub(crate) for parse testing)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    web: WebResults,
}

#[derive(Debug, Default, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<SearchSnippet>,
}

/// Parse a Brave web search response body into capped snippets.
///
/// Absent `web`/`results` fields yield an empty list rather than an error —
/// an empty result page is a valid provider answer.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the body is not valid JSON.
pub fn parse_results(body: &str) -> Result<Vec<SearchSnippet>, SearchError> {
    let resp: WebSearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;
    let mut results = resp.web.results;
    results.truncate(RESULT_CAP);
    Ok(results)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Brave web search API client.
pub struct BraveSearchClient {
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for BraveSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveSearchClient")
            .field("api_key", &"__REDACTED__")
            .finish_non_exhaustive()
    }
}

impl BraveSearchClient {
    /// Create a client holding the subscription token.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchClient for BraveSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, SearchError> {
        let count = RESULT_CAP.to_string();
        let response = self
            .client
            .get(SEARCH_API_URL)
            .timeout(SEARCH_TIMEOUT)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
                body: crate::providers::sanitize_http_error_body(&body),
            });
        }

        parse_results(&body)
    }
}
