//! Domain error types.

use thiserror::Error;

/// Errors that can occur while interpreting address registry data.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A status string did not name a known status.
    #[error("Unknown {kind} value: {value}")]
    UnknownStatus { kind: &'static str, value: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
