//! Indexer error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the indexer.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The projection failed to apply an event.
    #[error("Projection error: {0}")]
    Projection(#[from] projections::ProjectionError),

    /// The fact sink failed to store or report facts.
    #[error("Fact store error: {0}")]
    FactStore(#[from] fact_store::FactStoreError),

    /// The event store could not be reached or migrated.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The Prometheus exporter could not be installed.
    #[error("Metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// A pipeline task panicked or was aborted.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The batch buffer stopped admitting facts.
    #[error("Batch buffer closed")]
    BufferClosed,
}

/// Result type for indexer operations.
pub type Result<T> = std::result::Result<T, IndexerError>;
