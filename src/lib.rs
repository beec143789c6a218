//! Leadscout — a Telegram lead-qualification bot.
//!
//! Single Rust binary. Captures a social-media lead via `/analyze`, enriches
//! it with a Brave web search, and asks a completion model for a sales-fit
//! report with outreach drafts on `/report`. Per-call usage and cost are
//! appended to a SQLite ledger; the `usage-report` subcommand posts a cost
//! summary for the trailing day to an admin chat.
//!
//! See `DESIGN.md` for architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod ledger;
pub mod logging;
pub mod providers;
pub mod report;
pub mod reporter;
pub mod session;
pub mod telegram;
