//! Event store error types.

use thiserror::Error;

/// Errors raised while reading or appending to the event log.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The database rejected a query or could not be reached.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The event log schema could not be migrated.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
