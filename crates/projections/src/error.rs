//! Projection error types.

use thiserror::Error;

/// Errors that can occur during projection processing.
///
/// Every variant is fatal for the projection that raised it: the view can no
/// longer be trusted and must be rebuilt by a full replay.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// Failed to deserialize an event payload.
    #[error("Event deserialization error at sequence {sequence_number}: {source}")]
    Deserialization {
        sequence_number: i64,
        #[source]
        source: serde_json::Error,
    },

    /// The envelope carried an event the projection does not know how to apply.
    #[error("Unexpected event {event_type} at sequence {sequence_number}")]
    UnexpectedEvent {
        event_type: String,
        sequence_number: i64,
    },

    /// A change or delete referred to an entity missing from the view.
    #[error("Unknown {entity} {id} at sequence {sequence_number}")]
    UnknownEntity {
        entity: &'static str,
        id: String,
        sequence_number: i64,
    },

    /// A create referred to an entity already present in the view.
    #[error("Duplicate {entity} {id} at sequence {sequence_number}")]
    DuplicateEntity {
        entity: &'static str,
        id: String,
        sequence_number: i64,
    },

    /// The consumer of emitted facts has gone away.
    #[error("Change output closed")]
    OutputClosed,
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
