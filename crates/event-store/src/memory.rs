use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventEnvelope, Result, SequenceNumber,
    store::{EventStore, EventStream},
};

/// In-memory event store implementation for testing.
///
/// This implementation stores all events in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<SequenceNumber> {
        let mut store = self.events.write().await;

        let mut sequence_number = store
            .last()
            .map(|e| e.sequence_number)
            .unwrap_or_default();

        for mut event in events {
            sequence_number = sequence_number.next();
            event.sequence_number = sequence_number;
            store.push(event);
        }

        Ok(sequence_number)
    }

    async fn stream_from(&self, after: SequenceNumber) -> Result<EventStream> {
        use futures_util::stream;

        let store = self.events.read().await;
        // Stored in sequence order, so everything past `after` is a suffix.
        let start = store.partition_point(|e| e.sequence_number <= after);
        let events = store[start..].to_vec();

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn head(&self) -> Result<SequenceNumber> {
        let store = self.events.read().await;
        Ok(store
            .last()
            .map(|e| e.sequence_number)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AggregateId, EventStoreExt};
    use futures_util::StreamExt;

    fn create_test_event(event_type: &str) -> EventEnvelope {
        EventEnvelope::builder("Road", AggregateId::new(), event_type)
            .payload_raw(serde_json::json!({"test": true}))
    }

    async fn collect(stream: EventStream) -> Vec<EventEnvelope> {
        stream.map(|e| e.unwrap()).collect().await
    }

    #[tokio::test]
    async fn test_append_assigns_consecutive_sequence_numbers() {
        let store = InMemoryEventStore::new();

        let last = store
            .append(vec![
                create_test_event("Event1"),
                create_test_event("Event2"),
                create_test_event("Event3"),
            ])
            .await
            .unwrap();
        assert_eq!(last, SequenceNumber::new(3));

        let last = store.append_event(create_test_event("Event4")).await.unwrap();
        assert_eq!(last, SequenceNumber::new(4));

        let events = collect(store.stream_all_events().await.unwrap()).await;
        let positions: Vec<_> = events.iter().map(|e| e.sequence_number.as_i64()).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_append_overwrites_preset_sequence_numbers() {
        let store = InMemoryEventStore::new();
        let event = EventEnvelope::builder("Road", AggregateId::new(), "Event1")
            .sequence_number(SequenceNumber::new(99))
            .payload_raw(serde_json::json!({}));

        let last = store.append_event(event).await.unwrap();
        assert_eq!(last, SequenceNumber::first());
    }

    #[tokio::test]
    async fn test_stream_from_returns_only_newer_events() {
        let store = InMemoryEventStore::new();
        store
            .append(vec![
                create_test_event("Event1"),
                create_test_event("Event2"),
                create_test_event("Event3"),
            ])
            .await
            .unwrap();

        let events = collect(store.stream_from(SequenceNumber::new(1)).await.unwrap()).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "Event2");
        assert_eq!(events[1].event_type, "Event3");

        let events = collect(store.stream_from(SequenceNumber::new(3)).await.unwrap()).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_head_tracks_last_sequence_number() {
        let store = InMemoryEventStore::new();
        assert_eq!(store.head().await.unwrap(), SequenceNumber::initial());

        store
            .append(vec![create_test_event("Event1"), create_test_event("Event2")])
            .await
            .unwrap();
        assert_eq!(store.head().await.unwrap(), SequenceNumber::new(2));
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn test_clear_empties_the_store() {
        let store = InMemoryEventStore::new();
        store.append_event(create_test_event("Event1")).await.unwrap();

        store.clear().await;

        assert_eq!(store.event_count().await, 0);
        assert_eq!(store.head().await.unwrap(), SequenceNumber::initial());
    }
}
