//! Configuration loading and validation.
//!
//! Loads configuration from `./config.toml` (or `$LEADSCOUT_CONFIG_PATH`,
//! falling back to `~/.leadscout/config.toml`). Environment variables
//! override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// A required credential or setting was missing at startup.
///
/// Fatal: the affected subcommand refuses to start without it.
#[derive(Debug, thiserror::Error)]
#[error("missing required configuration: {what} (set {env_var})")]
pub struct ConfigMissing {
    what: &'static str,
    env_var: &'static str,
}

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeadscoutConfig {
    /// Telegram bot and admin settings (`[telegram]`).
    pub telegram: TelegramConfig,
    /// Completion provider settings (`[openai]`).
    pub openai: OpenAiConfig,
    /// Web search provider settings (`[brave]`).
    pub brave: BraveConfig,
    /// Per-provider unit prices for the accounting call site (`[pricing]`).
    pub pricing: PricingConfig,
    /// Filesystem paths (`[paths]`).
    pub paths: PathsConfig,
}

impl LeadscoutConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `path_override` (from the CLI `--config` flag) wins over
    /// `$LEADSCOUT_CONFIG_PATH`, `./config.toml`, and the home fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => Self::config_path_with(|key| std::env::var(key).ok()),
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides.
    fn load_from_file(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: LeadscoutConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(LeadscoutConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve the config file path using a custom env resolver (for testing).
    ///
    /// Checks `$LEADSCOUT_CONFIG_PATH`, then `./config.toml` if present,
    /// then `~/.leadscout/config.toml`.
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("LEADSCOUT_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return local;
        }
        match directories::BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(".leadscout").join("config.toml"),
            None => local,
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("LEADSCOUT_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = env("LEADSCOUT_ADMIN_CHAT_ID") {
            match v.parse() {
                Ok(id) => self.telegram.admin_chat_id = Some(id),
                Err(_) => tracing::warn!(
                    var = "LEADSCOUT_ADMIN_CHAT_ID",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("LEADSCOUT_OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = env("LEADSCOUT_OPENAI_MODEL") {
            self.openai.model = v;
        }
        if let Some(v) = env("LEADSCOUT_COMPLETION_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.openai.completion_timeout_secs = Some(n),
                Err(_) => tracing::warn!(
                    var = "LEADSCOUT_COMPLETION_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("LEADSCOUT_BRAVE_API_KEY") {
            self.brave.api_key = Some(v);
        }
        if let Some(v) = env("LEADSCOUT_CATALOG") {
            self.paths.catalog = v;
        }
        if let Some(v) = env("LEADSCOUT_USAGE_DB") {
            self.paths.usage_db = v;
        }
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: LeadscoutConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Validate the credentials required to run the conversational bot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigMissing`] if the bot token, OpenAI key, or Brave key
    /// is absent. The process must not start without them.
    pub fn validate_for_bot(&self) -> Result<(), ConfigMissing> {
        if self.telegram.bot_token.is_none() {
            return Err(ConfigMissing {
                what: "telegram bot token",
                env_var: "LEADSCOUT_BOT_TOKEN",
            });
        }
        if self.openai.api_key.is_none() {
            return Err(ConfigMissing {
                what: "OpenAI API key",
                env_var: "LEADSCOUT_OPENAI_API_KEY",
            });
        }
        if self.brave.api_key.is_none() {
            return Err(ConfigMissing {
                what: "Brave API key",
                env_var: "LEADSCOUT_BRAVE_API_KEY",
            });
        }
        Ok(())
    }

    /// Validate the credentials required to send the admin usage summary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigMissing`] if the bot token or admin chat id is absent.
    pub fn validate_for_usage_report(&self) -> Result<(), ConfigMissing> {
        if self.telegram.bot_token.is_none() {
            return Err(ConfigMissing {
                what: "telegram bot token",
                env_var: "LEADSCOUT_BOT_TOKEN",
            });
        }
        if self.telegram.admin_chat_id.is_none() {
            return Err(ConfigMissing {
                what: "admin chat id",
                env_var: "LEADSCOUT_ADMIN_CHAT_ID",
            });
        }
        Ok(())
    }
}

// ── Telegram config ─────────────────────────────────────────────

/// Telegram bot and admin delivery settings.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: Option<String>,
    /// Chat id that receives the admin usage summary.
    pub admin_chat_id: Option<i64>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "__REDACTED__"))
            .field("admin_chat_id", &self.admin_chat_id)
            .finish()
    }
}

// ── OpenAI config ───────────────────────────────────────────────

/// Completion provider settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Optional ceiling on the synthesis call, in seconds.
    ///
    /// Absent means the transport default applies.
    pub completion_timeout_secs: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            completion_timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .field("model", &self.model)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .finish()
    }
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

// ── Brave config ────────────────────────────────────────────────

/// Web search provider settings.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct BraveConfig {
    /// Subscription token for the Brave web search API.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for BraveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .finish()
    }
}

// ── Pricing config ──────────────────────────────────────────────

/// Unit prices used when recording usage into the ledger.
///
/// Defaults to zero — rows are still appended so unit counts stay
/// accurate even when no price list is configured.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Dollars per 1000 completion-provider tokens.
    pub openai_per_1k_tokens: f64,
    /// Dollars per web search query.
    pub brave_per_query: f64,
}

// ── Paths config ────────────────────────────────────────────────

/// Filesystem paths for the catalog, ledger database, and logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Offer catalog JSON document.
    pub catalog: String,
    /// Usage ledger SQLite database.
    pub usage_db: String,
    /// Directory for rotated JSON log files.
    pub logs_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: "catalog.json".to_string(),
            usage_db: "usage.db".to_string(),
            logs_dir: "logs".to_string(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
