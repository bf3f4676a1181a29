use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AggregateId;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Position of an event in the global, totally ordered event stream.
///
/// Sequence numbers start at 1 for the first stored event and increase by
/// one for every appended event. `SequenceNumber::initial()` (0) denotes
/// "before the first event" and is what an empty store or an empty fact
/// table reports as its high-water mark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceNumber(i64);

impl SequenceNumber {
    /// Creates a sequence number from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the position before the first event (0).
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the position of the first event (1).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next sequence number.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SequenceNumber {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<SequenceNumber> for i64 {
    fn from(sequence_number: SequenceNumber) -> Self {
        sequence_number.0
    }
}

/// An event envelope containing an event along with its metadata.
///
/// The sequence number of an envelope that has not been stored yet is
/// `SequenceNumber::initial()`; the store assigns the real position on append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "AccessAddressCreated").
    pub event_type: String,

    /// The stream this event belongs to.
    pub aggregate_id: AggregateId,

    /// The type of stream (e.g., "AccessAddress", "Road").
    pub aggregate_type: String,

    /// Global position of the event.
    pub sequence_number: SequenceNumber,

    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Starts an envelope for an event of `event_type` on the given stream.
    ///
    /// The builder is finished by supplying the payload.
    pub fn builder(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<AggregateId>,
        event_type: impl Into<String>,
    ) -> EventEnvelopeBuilder {
        EventEnvelopeBuilder {
            event_id: EventId::new(),
            event_type: event_type.into(),
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            sequence_number: SequenceNumber::initial(),
            timestamp: None,
        }
    }
}

/// Builder for event envelopes; `payload` or `payload_raw` completes it.
#[derive(Debug)]
pub struct EventEnvelopeBuilder {
    event_id: EventId,
    event_type: String,
    aggregate_id: AggregateId,
    aggregate_type: String,
    sequence_number: SequenceNumber,
    timestamp: Option<DateTime<Utc>>,
}

impl EventEnvelopeBuilder {
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = id;
        self
    }

    /// Sets the sequence number. Normally left unset and assigned by the store.
    pub fn sequence_number(mut self, sequence_number: SequenceNumber) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    /// Sets the recording time. Defaults to the time the payload is attached.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Serializes `payload` and builds the envelope.
    pub fn payload<T: Serialize>(self, payload: &T) -> Result<EventEnvelope, serde_json::Error> {
        Ok(self.payload_raw(serde_json::to_value(payload)?))
    }

    /// Builds the envelope around an already encoded payload.
    pub fn payload_raw(self, payload: serde_json::Value) -> EventEnvelope {
        EventEnvelope {
            event_id: self.event_id,
            event_type: self.event_type,
            aggregate_id: self.aggregate_id,
            aggregate_type: self.aggregate_type,
            sequence_number: self.sequence_number,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_new_creates_unique_ids() {
        let id1 = EventId::new();
        let id2 = EventId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_sequence_number_ordering() {
        let s1 = SequenceNumber::new(1);
        let s2 = SequenceNumber::new(2);
        assert!(s1 < s2);
        assert_eq!(s1.next(), s2);
    }

    #[test]
    fn test_sequence_number_initial_and_first() {
        assert_eq!(SequenceNumber::initial().as_i64(), 0);
        assert_eq!(SequenceNumber::first().as_i64(), 1);
        assert_eq!(SequenceNumber::initial().next(), SequenceNumber::first());
        assert_eq!(SequenceNumber::default(), SequenceNumber::initial());
    }

    #[test]
    fn test_builder_leaves_sequence_number_to_the_store() {
        let aggregate_id = AggregateId::new();
        let payload = serde_json::json!({"name": "Vejlevej"});

        let envelope =
            EventEnvelope::builder("Road", aggregate_id, "RoadCreated").payload_raw(payload.clone());

        assert_eq!(envelope.event_type, "RoadCreated");
        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.aggregate_type, "Road");
        assert_eq!(envelope.sequence_number, SequenceNumber::initial());
        assert_eq!(envelope.payload, payload);
    }

    #[test]
    fn test_builder_keeps_explicit_metadata() {
        let event_id = EventId::new();
        let timestamp = "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();

        let envelope = EventEnvelope::builder("Road", AggregateId::new(), "RoadDeleted")
            .event_id(event_id)
            .sequence_number(SequenceNumber::new(12))
            .timestamp(timestamp)
            .payload(&vec!["a", "b"])
            .unwrap();

        assert_eq!(envelope.event_id, event_id);
        assert_eq!(envelope.sequence_number, SequenceNumber::new(12));
        assert_eq!(envelope.timestamp, timestamp);
        assert_eq!(envelope.payload, serde_json::json!(["a", "b"]));
    }
}
