//! Database Infrastructure - PostgreSQL adapters for the domain ports
//!
//! Each repository implements one domain port against PostgreSQL via SQLx.
//! The correctness-critical pieces live here:
//!
//! - `commit` wraps the conditional debit, the credit, and the ledger
//!   append in one database transaction; the debit is a conditional
//!   `UPDATE ... WHERE balance >= amount`, never read-then-write.
//! - The daily transfer tracker is maintained with a single
//!   `INSERT ... ON CONFLICT` statement that resets on a calendar-day
//!   change and increments otherwise, atomically.
//! - Payout settlement locks the entry row and issues the compensating
//!   credit in the same transaction as the status flip.

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::{
    gateway::PostgresGatewayStore, schedule::PostgresScheduleStore,
    security::PostgresSecurityStore, wallet::PostgresWalletStore,
    workflows::PostgresWorkflowStore,
};

/// Embedded SQL migrations, applied at startup with `run_migrations`
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Applies pending migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
}
