//! Database layer for the Mizan settlement core.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The schema migration
//! - Repositories that run each settlement operation in one transaction

mod convert;
pub mod entities;
pub mod error;
mod lock;
pub mod migration;
pub mod repositories;
pub mod settings;
pub mod stock;

pub use error::FinanceError;
pub use repositories::{
    CompanyRepository, CompoundRepository, DocumentRepository, LedgerRepository,
    ObligationRepository, PartyRepository, TreasuryRepository,
};
pub use settings::LedgerSettings;
pub use stock::{StockGateway, StockMovementJournal};

use std::time::Duration;

use mizan_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
