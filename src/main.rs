//! Leadscout binary entry point.
//!
//! Subcommands:
//! - `start` — run the Telegram bot (default mode of operation)
//! - `usage-report` — aggregate the trailing day of usage and send the
//!   summary to the admin chat, then exit (driven by an external scheduler)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use leadscout::config::LeadscoutConfig;
use leadscout::enrichment::BraveSearchClient;
use leadscout::ledger::UsageLedger;
use leadscout::providers::openai::OpenAiProvider;
use leadscout::report::ReportPipeline;
use leadscout::session::LeadStore;
use leadscout::telegram::{self, SharedState};
use leadscout::{logging, reporter};

/// Telegram lead-qualification bot with a usage/cost ledger.
#[derive(Debug, Parser)]
#[command(name = "leadscout", version, about)]
struct Cli {
    /// Path to the config TOML (default: $LEADSCOUT_CONFIG_PATH, then
    /// ./config.toml, then ~/.leadscout/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the Telegram bot.
    Start,
    /// Send the trailing-day usage summary to the admin chat and exit.
    UsageReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real env vars still win inside the config loader.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Start => run_bot(cli.config).await,
        Command::UsageReport => run_usage_report(cli.config).await,
    }
}

/// Run the conversational bot until shutdown.
async fn run_bot(config_path: Option<PathBuf>) -> Result<()> {
    let config = LeadscoutConfig::load(config_path).context("failed to load configuration")?;

    let _logging_guard = logging::init_production(Path::new(&config.paths.logs_dir))
        .context("failed to initialise logging")?;

    // Missing credentials are fatal: the process must not start without them.
    config.validate_for_bot().context("startup aborted")?;
    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .context("bot token validated above")?;
    let openai_key = config
        .openai
        .api_key
        .clone()
        .context("OpenAI key validated above")?;
    let brave_key = config
        .brave
        .api_key
        .clone()
        .context("Brave key validated above")?;

    info!(model = %config.openai.model, "leadscout starting");

    let ledger = UsageLedger::open(Path::new(&config.paths.usage_db))
        .await
        .context("failed to open usage ledger")?;

    let leads = Arc::new(LeadStore::new());
    let search = Arc::new(BraveSearchClient::new(brave_key));
    let completion = Arc::new(OpenAiProvider::new(
        openai_key,
        config.openai.model.clone(),
        config.openai.completion_timeout_secs.map(Duration::from_secs),
    ));
    let pipeline = Arc::new(ReportPipeline::new(
        Arc::clone(&leads),
        search,
        completion,
        PathBuf::from(&config.paths.catalog),
    ));

    let state = SharedState {
        leads,
        pipeline,
        ledger,
        pricing: config.pricing.clone(),
    };

    telegram::run_telegram(&bot_token, state).await?;

    info!("leadscout shut down cleanly");
    Ok(())
}

/// Send the admin usage summary once and exit.
async fn run_usage_report(config_path: Option<PathBuf>) -> Result<()> {
    logging::init_cli();

    let config = LeadscoutConfig::load(config_path).context("failed to load configuration")?;

    let ledger = UsageLedger::open(Path::new(&config.paths.usage_db))
        .await
        .context("failed to open usage ledger")?;

    reporter::send_usage_summary(&config, &ledger).await
}
