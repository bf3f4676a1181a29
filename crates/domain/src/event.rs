//! Domain event trait.

use common::AggregateId;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event store filtering.
    fn event_type(&self) -> &'static str;

    /// Returns the stream type the event is published on.
    fn aggregate_type(&self) -> &'static str;

    /// Returns the id of the entity the event is about.
    fn aggregate_id(&self) -> AggregateId;
}
