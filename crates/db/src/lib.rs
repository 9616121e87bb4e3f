//! Database layer with `SeaORM` over embedded SQLite.
//!
//! This crate provides:
//! - The schema-driven document store and its transactions
//! - `SeaORM` entities and the ledger repository
//! - The posting service (submit and cancel)
//! - The cached report runner
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod posting;
pub mod reports;
pub mod repositories;
pub mod store;

pub use posting::{PostingError, PostingService};
pub use reports::{
    GeneralLedger, ProfitAndLoss, ReportRunError, ReportRunner, ReportSource, TrialBalanceReport,
};
pub use repositories::LedgerRepository;
pub use store::{DocumentStore, DocumentTx, StoreError};

use std::time::Duration;

use folio_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::debug;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let (min_connections, max_connections) = config.pool_size();
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;

    // Readers on other connections keep going while a write transaction
    // is open. The journal mode is stored in the database file.
    if !config.is_in_memory() {
        db.execute_unprepared("PRAGMA journal_mode = WAL").await?;
    }
    debug!(max_connections, "connected");
    Ok(db)
}
