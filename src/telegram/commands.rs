//! Slash command handlers.
//!
//! Each function handles one command and returns the reply string. Replies
//! are plain text: report output is free-form model prose and the hard
//! reply cut could split markup mid-entity.

use tracing::{error, warn};

use super::SharedState;
use crate::report::ReportError;
use crate::session::LeadStore;

/// Usage text for `/analyze` (also the `/start` greeting).
const ANALYZE_USAGE: &str = "Use /analyze @username";

/// `/start` — static greeting.
pub fn handle_start() -> String {
    ANALYZE_USAGE.to_owned()
}

/// `/help` — static command list.
pub fn handle_help() -> String {
    "Commands: /analyze @username, then /report".to_owned()
}

/// `/analyze <handle>` — capture (or overwrite) the chat's lead.
///
/// Requires exactly one argument; a leading `@` is stripped before the
/// username is stored.
pub async fn handle_analyze(leads: &LeadStore, chat_id: i64, args: &str) -> String {
    if args.is_empty() || args.contains(' ') {
        return ANALYZE_USAGE.to_owned();
    }

    let username = args.strip_prefix('@').unwrap_or(args).to_owned();
    if username.is_empty() {
        return ANALYZE_USAGE.to_owned();
    }

    leads.put(chat_id, username).await;
    "Now paste ONE message with:\nBIO: ...\nLINK: ...\nPOSTS: ...\nNOTES: ...".to_owned()
}

/// `/report` — run the full enrichment + synthesis pipeline for the chat's
/// current lead, record usage, and return the truncated report.
///
/// Missing-lead is the only user error; every other failure is logged and
/// answered with a short generic message so one conversation's failure
/// stays isolated.
pub async fn handle_report(state: &SharedState, chat_id: i64) -> String {
    let report = match state.pipeline.generate_report(chat_id).await {
        Ok(report) => report,
        Err(ReportError::NoActiveLead) => return "Run /analyze first.".to_owned(),
        Err(e) => {
            warn!(chat_id, error = %e, "report pipeline failed");
            return "Sorry, I ran into an error generating that report.".to_owned();
        }
    };

    // Accounting before the reply: a ledger write failure fails the request
    // rather than undercounting.
    if let Err(e) = record_usage(state, &report).await {
        error!(chat_id, error = %e, "usage recording failed");
        return "Sorry, I ran into an error generating that report.".to_owned();
    }

    report.text
}

/// Append usage rows for the completion and search calls behind one report.
async fn record_usage(
    state: &SharedState,
    report: &crate::report::LeadReport,
) -> Result<(), crate::ledger::LedgerError> {
    let tokens = report.usage.total_tokens();
    let tokens_u32 = u32::try_from(tokens).unwrap_or(u32::MAX);
    let openai_cost = f64::from(tokens_u32) / 1000.0 * state.pricing.openai_per_1k_tokens;
    state.ledger.record("openai", tokens, openai_cost).await?;

    let snippet_count = u64::try_from(report.search_results).unwrap_or(u64::MAX);
    state
        .ledger
        .record("brave", snippet_count, state.pricing.brave_per_query)
        .await?;

    Ok(())
}
