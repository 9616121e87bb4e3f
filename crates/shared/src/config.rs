//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Bookkeeping configuration used by the posting engine and reports.
    #[serde(default)]
    pub accounting: AccountingConfig,
    /// Where schema definitions are loaded from.
    #[serde(default)]
    pub schemas: SchemaConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`sqlite://books.db?mode=rwc`, `sqlite::memory:`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: default_url(),
            max_connections: 1,
            min_connections: 1,
        }
    }

    /// Whether the URL names an in-memory `SQLite` database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// `(min, max)` pool size.
    ///
    /// An in-memory database lives only as long as its connection and is
    /// private to it, so its pool is pinned to exactly one connection.
    #[must_use]
    pub fn pool_size(&self) -> (u32, u32) {
        if self.is_in_memory() {
            return (1, 1);
        }
        let max = self.max_connections.max(1);
        (self.min_connections.min(max), max)
    }
}

/// Bookkeeping configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountingConfig {
    /// Base currency of the books; fixes the precision of every ledger amount.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// Account receiving the round-off entry of an otherwise unbalanced posting.
    #[serde(default = "default_round_off_account")]
    pub round_off_account: Option<String>,
    /// Account receiving voucher discounts.
    #[serde(default = "default_discount_account")]
    pub discount_account: Option<String>,
    /// Largest absolute residue absorbed by a round-off entry.
    ///
    /// A posting whose debits and credits differ by more than this fails
    /// instead of being balanced silently.
    #[serde(default = "default_round_off_tolerance")]
    pub round_off_tolerance: Decimal,
    /// Decimal places kept for per-unit costs in reports.
    #[serde(default = "default_cost_precision")]
    pub cost_precision: u32,
}

fn default_currency() -> Currency {
    Currency::Usd
}

#[allow(clippy::unnecessary_wraps)]
fn default_round_off_account() -> Option<String> {
    Some("Rounded Off".to_string())
}

#[allow(clippy::unnecessary_wraps)]
fn default_discount_account() -> Option<String> {
    Some("Discounts".to_string())
}

fn default_round_off_tolerance() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_cost_precision() -> u32 {
    4
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            round_off_account: default_round_off_account(),
            discount_account: default_discount_account(),
            round_off_tolerance: default_round_off_tolerance(),
            cost_precision: default_cost_precision(),
        }
    }
}

impl AccountingConfig {
    /// Decimal places of every ledger amount.
    #[must_use]
    pub fn precision(&self) -> u32 {
        self.currency.precision()
    }
}

/// Schema source configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    /// Path of a JSON file with schema definitions. The bundled accounting
    /// schemas are used when unset.
    pub path: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
