//! Telegram adapter: slash command dispatch and the bot event loop.
//!
//! One logical flow per incoming command. Different chats may be handled
//! concurrently by the dispatcher; the only shared mutable structure is the
//! [`LeadStore`], whose per-key entries resolve last-write-wins.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::ledger::UsageLedger;
use crate::report::ReportPipeline;
use crate::session::LeadStore;

pub mod commands;

// ---------------------------------------------------------------------------
// Shared state for handler injection
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
pub struct SharedState {
    /// In-memory lead records, keyed by chat id.
    pub leads: Arc<LeadStore>,
    /// The report workflow.
    pub pipeline: Arc<ReportPipeline>,
    /// Usage/cost accounting.
    pub ledger: UsageLedger,
    /// Unit prices for the accounting call site.
    pub pricing: PricingConfig,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Run the Telegram bot event loop.
///
/// Blocks until the bot is stopped (Ctrl+C).
///
/// # Errors
///
/// Returns an error if the dispatcher fails to start.
pub async fn run_telegram(bot_token: &str, state: SharedState) -> anyhow::Result<()> {
    let bot = Bot::new(bot_token);

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

// ---------------------------------------------------------------------------
// Message handler
// ---------------------------------------------------------------------------

/// Handle an incoming Telegram message.
///
/// Slash commands are dispatched and answered; any other text is kept as
/// the current lead's pasted bio block and not answered.
async fn handle_message(bot: Bot, msg: Message, state: SharedState) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    debug!(chat_id, "telegram message received");

    let Some(text) = msg.text() else {
        debug!(chat_id, "non-text message, ignoring");
        return Ok(());
    };

    if text.starts_with('/') {
        let reply = dispatch_command(text, &state, chat_id).await;
        bot.send_message(msg.chat.id, reply).await?;
        return Ok(());
    }

    // Free-text after /analyze is the pasted bio block. Stored verbatim,
    // never parsed, never answered.
    if state.leads.set_bio(chat_id, text.to_owned()).await {
        debug!(chat_id, "bio block stored for active lead");
    } else {
        debug!(chat_id, "free text with no active lead, dropped");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Command dispatcher
// ---------------------------------------------------------------------------

/// Parse and dispatch a slash command, returning the reply text.
pub async fn dispatch_command(text: &str, state: &SharedState, chat_id: i64) -> String {
    // Strip the leading "/" and split into command and args
    let without_slash = &text[1..];
    let (full_command, args) = match without_slash.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (without_slash, ""),
    };
    // Handle bot-mention suffixes like "/report@leadscout_bot"
    let command = full_command.split('@').next().unwrap_or(full_command);

    match command {
        "start" => commands::handle_start(),
        "help" => commands::handle_help(),
        "analyze" => commands::handle_analyze(&state.leads, chat_id, args).await,
        "report" => commands::handle_report(state, chat_id).await,
        other => {
            warn!(chat_id, command = other, "unknown command");
            format!("Unknown command: /{other}")
        }
    }
}
