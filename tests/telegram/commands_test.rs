//! Tests for `telegram::commands` slash command handlers and dispatch.

use std::io::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use leadscout::config::PricingConfig;
use leadscout::enrichment::{SearchClient, SearchError, SearchSnippet};
use leadscout::ledger::UsageLedger;
use leadscout::providers::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderError, UsageStats,
};
use leadscout::report::ReportPipeline;
use leadscout::session::LeadStore;
use leadscout::telegram::{commands, dispatch_command, SharedState};

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

struct StubSearch;

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchSnippet>, SearchError> {
        Ok(vec![
            SearchSnippet {
                title: "Alice — LinkedIn".to_owned(),
                url: "https://linkedin.com/in/alice".to_owned(),
                description: "Fitness coach".to_owned(),
            },
            SearchSnippet {
                title: "Alice interview".to_owned(),
                url: "https://example.com/a".to_owned(),
                description: "Podcast".to_owned(),
            },
        ])
    }
}

struct StubCompletion;

#[async_trait]
impl CompletionProvider for StubCompletion {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse {
            text: "Fit score: 72".to_owned(),
            usage: UsageStats {
                input_tokens: 100,
                output_tokens: 20,
            },
            model: "stub".to_owned(),
        })
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

async fn memory_ledger() -> UsageLedger {
    let opts = SqliteConnectOptions::new()
        .filename(":memory:")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .expect("pool should connect");
    UsageLedger::from_pool(pool)
        .await
        .expect("schema should apply")
}

fn catalog_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp catalog");
    file.write_all(br#"{"DM Setup": {"cost": 50, "price": 300, "allowed": true}}"#)
        .expect("write catalog");
    file
}

async fn shared_state(catalog: &tempfile::NamedTempFile) -> SharedState {
    let leads = Arc::new(LeadStore::new());
    let pipeline = Arc::new(ReportPipeline::new(
        Arc::clone(&leads),
        Arc::new(StubSearch),
        Arc::new(StubCompletion),
        catalog.path().to_path_buf(),
    ));
    SharedState {
        leads,
        pipeline,
        ledger: memory_ledger().await,
        pricing: PricingConfig {
            openai_per_1k_tokens: 0.01,
            brave_per_query: 0.005,
        },
    }
}

fn ago(d: Duration) -> DateTime<Utc> {
    Utc::now().checked_sub_signed(d).expect("clock underflow")
}

// ---------------------------------------------------------------------------
// Static commands
// ---------------------------------------------------------------------------

#[test]
fn start_returns_analyze_usage() {
    assert_eq!(commands::handle_start(), "Use /analyze @username");
}

#[test]
fn help_lists_both_workflow_commands() {
    let reply = commands::handle_help();
    assert!(reply.contains("/analyze"));
    assert!(reply.contains("/report"));
}

// ---------------------------------------------------------------------------
// /analyze
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_without_argument_replies_usage() {
    let leads = LeadStore::new();
    let reply = commands::handle_analyze(&leads, 1, "").await;
    assert_eq!(reply, "Use /analyze @username");
    assert!(leads.get(1).await.is_none());
}

#[tokio::test]
async fn analyze_with_extra_arguments_replies_usage() {
    let leads = LeadStore::new();
    let reply = commands::handle_analyze(&leads, 1, "alice bob").await;
    assert_eq!(reply, "Use /analyze @username");
    assert!(leads.get(1).await.is_none());
}

#[tokio::test]
async fn analyze_strips_leading_at_sign() {
    let leads = LeadStore::new();

    commands::handle_analyze(&leads, 1, "@alice").await;
    let with_at = leads.get(1).await.expect("lead stored");

    commands::handle_analyze(&leads, 2, "alice").await;
    let without_at = leads.get(2).await.expect("lead stored");

    // "@alice" and "alice" produce identical stored records.
    assert_eq!(with_at.username, "alice");
    assert_eq!(with_at.username, without_at.username);
}

#[tokio::test]
async fn analyze_bare_at_sign_replies_usage() {
    let leads = LeadStore::new();
    let reply = commands::handle_analyze(&leads, 1, "@").await;
    assert_eq!(reply, "Use /analyze @username");
    assert!(leads.get(1).await.is_none());
}

#[tokio::test]
async fn analyze_replies_with_paste_instructions() {
    let leads = LeadStore::new();
    let reply = commands::handle_analyze(&leads, 1, "@alice").await;
    assert!(reply.contains("BIO:"));
    assert!(reply.contains("LINK:"));
    assert!(reply.contains("POSTS:"));
    assert!(reply.contains("NOTES:"));
}

#[tokio::test]
async fn analyze_reissued_overwrites_prior_record() {
    let leads = LeadStore::new();
    commands::handle_analyze(&leads, 1, "@alice").await;
    commands::handle_analyze(&leads, 1, "@bob").await;

    assert_eq!(leads.get(1).await.expect("lead stored").username, "bob");
}

// ---------------------------------------------------------------------------
// /report
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_without_lead_says_run_analyze_first() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;

    let reply = commands::handle_report(&state, 1).await;
    assert_eq!(reply, "Run /analyze first.");
}

#[tokio::test]
async fn report_with_lead_returns_synthesis_and_records_usage() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;
    state.leads.put(1, "alice".to_owned()).await;

    let reply = commands::handle_report(&state, 1).await;
    assert_eq!(reply, "Fit score: 72");

    let rows = state
        .ledger
        .aggregate(ago(Duration::days(1)))
        .await
        .expect("aggregate");
    assert_eq!(rows.len(), 2);

    // brave: one row per report, units = snippet count, flat per-query price.
    assert_eq!(rows[0].provider, "brave");
    assert_eq!(rows[0].units, 2);
    assert!((rows[0].cost - 0.005).abs() < 1e-9);

    // openai: units = input + output tokens, priced per 1k tokens.
    assert_eq!(rows[1].provider, "openai");
    assert_eq!(rows[1].units, 120);
    assert!((rows[1].cost - 0.0012).abs() < 1e-9);
}

#[tokio::test]
async fn report_with_missing_catalog_replies_generic_error() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;
    state.leads.put(1, "alice".to_owned()).await;
    drop(catalog);

    let reply = commands::handle_report(&state, 1).await;
    assert_eq!(reply, "Sorry, I ran into an error generating that report.");

    // Nothing was recorded for the failed request.
    let rows = state
        .ledger
        .aggregate(ago(Duration::days(1)))
        .await
        .expect("aggregate");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn report_with_failed_ledger_write_replies_generic_error() {
    let catalog = catalog_file();

    let opts = SqliteConnectOptions::new()
        .filename(":memory:")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .expect("pool should connect");
    let ledger = UsageLedger::from_pool(pool.clone())
        .await
        .expect("schema should apply");

    let leads = Arc::new(LeadStore::new());
    let pipeline = Arc::new(ReportPipeline::new(
        Arc::clone(&leads),
        Arc::new(StubSearch),
        Arc::new(StubCompletion),
        catalog.path().to_path_buf(),
    ));
    let state = SharedState {
        leads,
        pipeline,
        ledger,
        pricing: PricingConfig::default(),
    };
    state.leads.put(1, "alice".to_owned()).await;

    pool.close().await;

    // An unrecordable report is a failed request, not a silent undercount.
    let reply = commands::handle_report(&state, 1).await;
    assert_eq!(reply, "Sorry, I ran into an error generating that report.");
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_routes_known_commands() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;

    assert_eq!(
        dispatch_command("/start", &state, 1).await,
        "Use /analyze @username"
    );
    assert!(dispatch_command("/help", &state, 1)
        .await
        .contains("/analyze"));
    assert_eq!(
        dispatch_command("/report", &state, 1).await,
        "Run /analyze first."
    );
}

#[tokio::test]
async fn dispatch_strips_bot_mention_suffix() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;

    let reply = dispatch_command("/help@leadscout_bot", &state, 1).await;
    assert!(reply.contains("/analyze"));
}

#[tokio::test]
async fn dispatch_passes_analyze_argument() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;

    dispatch_command("/analyze @alice", &state, 1).await;
    assert_eq!(
        state.leads.get(1).await.expect("lead stored").username,
        "alice"
    );
}

#[tokio::test]
async fn dispatch_unknown_command_is_reported() {
    let catalog = catalog_file();
    let state = shared_state(&catalog).await;

    let reply = dispatch_command("/frobnicate", &state, 1).await;
    assert_eq!(reply, "Unknown command: /frobnicate");
}
