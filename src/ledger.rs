//! Append-only usage/cost ledger over SQLite.
//!
//! One row per provider call: UTC timestamp, provider tag, unit count,
//! cost. There is no update or delete path. Write errors always propagate —
//! undercounting cost is a correctness violation for a billing-adjacent
//! table, so nothing here is fire-and-forget.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Usage table schema, applied on open.
const SCHEMA: &str = include_str!("../migrations/001_usage.sql");

/// Aggregated usage for one provider over a query window.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderUsage {
    /// Provider tag as recorded.
    pub provider: String,
    /// Sum of units in the window.
    pub units: i64,
    /// Sum of cost in the window.
    pub cost: f64,
}

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Database operation failed.
    #[error("ledger database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only usage ledger backed by a SQLite pool.
///
/// The pool is held for the process lifetime; each statement commits
/// independently, so there is no cross-call transaction to manage.
#[derive(Debug, Clone)]
pub struct UsageLedger {
    db: SqlitePool,
}

impl UsageLedger {
    /// Open (creating if missing) the ledger database at `path` and apply
    /// the schema.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the database cannot be opened or the
    /// schema cannot be applied.
    pub async fn open(path: &Path) -> Result<Self, LedgerError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&db).await?;
        info!(path = %path.display(), "usage ledger opened");
        Ok(Self { db })
    }

    /// Wrap an existing pool (for tests against in-memory databases).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the schema cannot be applied.
    pub async fn from_pool(db: SqlitePool) -> Result<Self, LedgerError> {
        sqlx::raw_sql(SCHEMA).execute(&db).await?;
        Ok(Self { db })
    }

    /// Append one usage row stamped with the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the insert fails. Callers must not
    /// swallow this.
    pub async fn record(&self, provider: &str, units: u64, cost: f64) -> Result<(), LedgerError> {
        self.record_at(provider, units, cost, Utc::now()).await
    }

    /// Append one usage row with an explicit timestamp (for tests).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the insert fails.
    pub async fn record_at(
        &self,
        provider: &str,
        units: u64,
        cost: f64,
        ts: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let units_i64 = i64::try_from(units).unwrap_or(i64::MAX);
        sqlx::query("INSERT INTO usage (ts, provider, units, cost) VALUES (?1, ?2, ?3, ?4)")
            .bind(ts.to_rfc3339())
            .bind(provider)
            .bind(units_i64)
            .bind(cost)
            .execute(&self.db)
            .await?;
        debug!(provider, units, cost, "usage recorded");
        Ok(())
    }

    /// Sum units and cost per provider for rows with `ts >= since`.
    ///
    /// Providers with no rows in the window are omitted, not zero-filled;
    /// callers treat absence as zero. Rows come back ordered by provider
    /// name for stable rendering.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the query fails.
    pub async fn aggregate(&self, since: DateTime<Utc>) -> Result<Vec<ProviderUsage>, LedgerError> {
        let rows: Vec<(String, i64, f64)> = sqlx::query_as(
            "SELECT provider, SUM(units), SUM(cost) \
             FROM usage \
             WHERE ts >= ?1 \
             GROUP BY provider \
             ORDER BY provider",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(provider, units, cost)| ProviderUsage {
                provider,
                units,
                cost,
            })
            .collect())
    }
}

/// Render the fixed-format usage summary with a grand total.
///
/// One line per provider plus a total across all providers, currency in
/// 4-decimal fixed point.
pub fn format_usage_report(rows: &[ProviderUsage]) -> String {
    let mut total = 0.0_f64;
    let mut text = String::from("\u{1F4CA} Daily Usage Report\n\n");
    for row in rows {
        total += row.cost;
        text.push_str(&format!(
            "{}: {} units | ${:.4}\n",
            row.provider, row.units, row.cost
        ));
    }
    text.push_str(&format!("\nTotal: ${total:.4}"));
    text
}
