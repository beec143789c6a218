//! Report synthesis pipeline — the workflow's decision core.
//!
//! A session is in one of two states: no lead captured, or a lead captured
//! via `/analyze`. Report generation requires the latter and never changes
//! state, so `/report` may be re-issued freely; each run re-executes the
//! full enrichment + synthesis pipeline from scratch. Correctness here
//! means the report always reflects the latest captured lead and the
//! catalog document as it stands right now, so nothing is cached.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{self, Catalog, CatalogError};
use crate::enrichment::{SearchClient, SearchError, SearchSnippet};
use crate::providers::{CompletionProvider, CompletionRequest, ProviderError, UsageStats};
use crate::session::LeadStore;

/// Fixed disjunctive hint appended to the lead's username when searching.
const SEARCH_HINT: &str = "LinkedIn OR interview OR website OR TikTok OR YouTube";

/// System persona for the synthesis call.
const PERSONA: &str = "You are a sharp, realistic sales strategist.";

/// Sampling temperature — low, leaning deterministic.
const TEMPERATURE: f32 = 0.35;

/// Hard reply-size ceiling imposed by the delivery channel.
pub const MAX_REPLY_CHARS: usize = 4000;

/// Errors from the report workflow, one variant per failure class.
///
/// Conversions are explicit rather than `#[from]` so the enrichment and
/// synthesis calls stay distinguishable at the workflow boundary.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// No lead has been captured for this chat.
    #[error("no active lead for this chat")]
    NoActiveLead,
    /// The web enrichment call failed.
    #[error("web enrichment failed: {0}")]
    EnrichmentFailed(#[source] SearchError),
    /// The catalog document is missing or malformed.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),
    /// The completion call failed.
    #[error("report synthesis failed: {0}")]
    SynthesisFailed(#[source] ProviderError),
}

/// A generated sales-fit report plus the figures the accounting call
/// site needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadReport {
    /// Report text, already truncated to [`MAX_REPLY_CHARS`].
    pub text: String,
    /// Token usage of the synthesis call.
    pub usage: UsageStats,
    /// Number of search snippets the enrichment call returned.
    pub search_results: usize,
}

/// Orchestrates lead lookup, enrichment, catalog load, and synthesis.
pub struct ReportPipeline {
    leads: Arc<LeadStore>,
    search: Arc<dyn SearchClient>,
    completion: Arc<dyn CompletionProvider>,
    catalog_path: PathBuf,
}

impl std::fmt::Debug for ReportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportPipeline")
            .field("catalog_path", &self.catalog_path)
            .field("model", &self.completion.model_id())
            .finish_non_exhaustive()
    }
}

impl ReportPipeline {
    /// Create a pipeline over the injected collaborators.
    pub fn new(
        leads: Arc<LeadStore>,
        search: Arc<dyn SearchClient>,
        completion: Arc<dyn CompletionProvider>,
        catalog_path: PathBuf,
    ) -> Self {
        Self {
            leads,
            search,
            completion,
            catalog_path,
        }
    }

    /// Generate a sales-fit report for the chat's current lead.
    ///
    /// Runs the single-pass pipeline: lead lookup, web enrichment, fresh
    /// catalog load, prompt assembly, synthesis, hard truncation.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NoActiveLead`] when no lead was captured for
    /// `chat_id`; otherwise the first failing stage's error.
    pub async fn generate_report(&self, chat_id: i64) -> Result<LeadReport, ReportError> {
        let lead = self
            .leads
            .get(chat_id)
            .await
            .ok_or(ReportError::NoActiveLead)?;

        let query = build_search_query(&lead.username);
        debug!(chat_id, username = %lead.username, "running lead enrichment search");
        let snippets = self
            .search
            .search(&query)
            .await
            .map_err(ReportError::EnrichmentFailed)?;

        // Reloaded on every request so edits to the document take effect
        // without a restart.
        let catalog =
            catalog::load(&self.catalog_path).map_err(ReportError::CatalogUnavailable)?;

        let prompt = build_prompt(&lead.username, &snippets, &catalog);
        let response = self
            .completion
            .complete(CompletionRequest {
                system: PERSONA.to_owned(),
                user: prompt,
                temperature: TEMPERATURE,
            })
            .await
            .map_err(ReportError::SynthesisFailed)?;

        let text = truncate_reply(response.text.trim(), MAX_REPLY_CHARS);
        info!(
            chat_id,
            username = %lead.username,
            snippets = snippets.len(),
            tokens = response.usage.total_tokens(),
            "report generated"
        );

        Ok(LeadReport {
            text,
            usage: response.usage,
            search_results: snippets.len(),
        })
    }
}

/// Build the enrichment query for a username.
///
/// Deterministic: username plus the fixed identity/profile discovery hint.
pub fn build_search_query(username: &str) -> String {
    format!("{username} {SEARCH_HINT}")
}

/// Assemble the synthesis prompt from the lead, search snippets, and catalog.
///
/// Snippets and catalog are embedded as JSON, unmodified — no
/// deduplication, re-ranking, or normalization.
pub fn build_prompt(username: &str, snippets: &[SearchSnippet], catalog: &Catalog) -> String {
    let web_results =
        serde_json::to_string_pretty(snippets).unwrap_or_else(|_| "[]".to_owned());
    let catalog_json =
        serde_json::to_string_pretty(catalog).unwrap_or_else(|_| "{}".to_owned());

    format!(
        "Analyze this Instagram lead:\n\
         Username: {username}\n\
         \n\
         Public web results:\n\
         {web_results}\n\
         \n\
         Catalog:\n\
         {catalog_json}\n\
         \n\
         Tasks:\n\
         1) Fit score 0-100 + budget (Low/Med/High) with evidence\n\
         2) Top 3 authority gaps\n\
         3) Recommend ONE primary offer and ONE upsell (choose from catalog, allowed=true)\n\
         4) Include cost, sell price, profit\n\
         5) Write DM1 + Follow-up1 + Follow-up2\n\
         Rules: No illegal actions, no private data, no scraping bypass, no guarantees of editorial.\n"
    )
}

/// Hard-cut `text` to at most `max_chars` characters.
///
/// The cut lands on a `char` boundary and makes no attempt to preserve
/// message structure — this is a channel limit, not a content decision.
/// Already-short input passes through unchanged.
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    text.chars().take(max_chars).collect()
}
