//! Application configuration management.

use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour switches.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
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

/// What happens to earlier treasury withdrawals when an installment is
/// deleted or its obligation cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReversalPolicy {
    /// Treasury withdrawals stay booked; only party entries are reversed.
    #[default]
    Legacy,
    /// A compensating treasury deposit is booked for every orphaned withdrawal.
    Strict,
}

/// Where the per-obligation claim entries of an expense allocation are booked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseLedgerMode {
    /// After the expense rows commit, best effort; failures are logged.
    #[default]
    Deferred,
    /// Inside the same database transaction as the expense rows.
    Atomic,
}

/// Ledger behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency treasury balances are denominated in.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Treasury handling on installment deletion and obligation cancel.
    #[serde(default)]
    pub reversal_policy: ReversalPolicy,
    /// Placement of the expense-allocation ledger fan-out.
    #[serde(default)]
    pub expense_ledger_mode: ExpenseLedgerMode,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            reversal_policy: ReversalPolicy::default(),
            expense_ledger_mode: ExpenseLedgerMode::default(),
        }
    }
}

fn default_base_currency() -> String {
    "LYD".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if a source cannot be read or a
    /// required field such as `database.url` is missing.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MIZAN").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
