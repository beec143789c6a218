//! Admin usage summary delivery.
//!
//! Queries the ledger for the trailing 24 hours, renders the fixed-format
//! summary, and pushes it to the admin chat. Invoked out-of-band by the
//! `usage-report` subcommand (cron or any external scheduler drives the
//! cadence), never by an in-process event.

use anyhow::{Context, Result};
use chrono::Utc;
use teloxide::prelude::*;
use tracing::info;

use crate::config::LeadscoutConfig;
use crate::ledger::{format_usage_report, UsageLedger};

/// Aggregate the trailing day of usage and send the summary to the admin
/// chat.
///
/// # Errors
///
/// Returns an error if required credentials are missing, the aggregate
/// query fails, or the Telegram send fails.
pub async fn send_usage_summary(config: &LeadscoutConfig, ledger: &UsageLedger) -> Result<()> {
    config.validate_for_usage_report()?;
    let token = config
        .telegram
        .bot_token
        .as_deref()
        .context("bot token checked above")?;
    let admin_chat_id = config
        .telegram
        .admin_chat_id
        .context("admin chat id checked above")?;

    let since = Utc::now()
        .checked_sub_signed(chrono::Duration::days(1))
        .context("clock underflow computing report window")?;

    let rows = ledger.aggregate(since).await?;
    let text = format_usage_report(&rows);

    let bot = Bot::new(token);
    bot.send_message(ChatId(admin_chat_id), text)
        .await
        .context("failed to send usage summary to admin chat")?;

    info!(admin_chat_id, providers = rows.len(), "usage summary sent");
    Ok(())
}
