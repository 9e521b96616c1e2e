//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::CENT;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger posting configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Bank reconciliation configuration.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger posting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Payment method recorded when a payment arrives without a recognised one.
    #[serde(default = "default_payment_method")]
    pub default_payment_method: String,
}

fn default_payment_method() -> String {
    "eft".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_payment_method: default_payment_method(),
        }
    }
}

/// Bank reconciliation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Days either side of a bank line's date searched for candidate transactions.
    #[serde(default = "default_match_window_days")]
    pub match_window_days: u32,
    /// Amounts closer than this are considered equal when matching.
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: Decimal,
}

fn default_match_window_days() -> u32 {
    3
}

fn default_amount_tolerance() -> Decimal {
    CENT
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            match_window_days: default_match_window_days(),
            amount_tolerance: default_amount_tolerance(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "strata=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `STRATA__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STRATA").separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reads a `.env` file if present, then loads configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::load()
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.reconciliation.amount_tolerance <= Decimal::ZERO {
            return Err(config::ConfigError::Message(
                "reconciliation.amount_tolerance must be positive".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(config::ConfigError::Message(
                "database.min_connections cannot exceed database.max_connections".to_string(),
            ));
        }
        Ok(())
    }
}
