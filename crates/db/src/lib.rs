//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories executing the ledger operations inside database transactions
//! - The schema migration, including the seeded chart of accounts

pub mod entities;
pub mod error;
mod mapping;
pub mod migration;
pub mod repositories;

pub use error::RepositoryError;
pub use repositories::{
    AccountRepository, FinancialYearRepository, InvoicePaymentService, ReconciliationRepository,
    ReportRepository, TransactionRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use strata_shared::config::DatabaseConfig;

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
