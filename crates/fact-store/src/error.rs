//! Fact store error types.

use thiserror::Error;

/// Errors that can occur when writing or reading change facts.
#[derive(Debug, Error)]
pub enum FactStoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A fact with the same key is already stored, or appears twice in one batch.
    #[error("Duplicate fact: {0}")]
    DuplicateFact(String),

    /// A schema or table name is not a plain SQL identifier.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A stored change type could not be parsed.
    #[error(transparent)]
    UnknownChangeType(#[from] projections::UnknownChangeType),
}

/// Result type for fact store operations.
pub type Result<T> = std::result::Result<T, FactStoreError>;
