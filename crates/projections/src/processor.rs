//! Projection processor for feeding events to projections.

use event_store::{EventEnvelope, EventStore, SequenceNumber};
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::Projection;

/// Processes events from an event store and delivers them to projections.
///
/// The processor owns the delivery cursor, the sequence number of the last
/// event handed to the projections. It supports:
/// - Replay: resets all projections and delivers the full history
/// - Catch-up: delivers only events past the cursor
/// - Single event delivery
///
/// Deliveries are serialized on the cursor lock, so projections see one
/// event at a time in sequence order.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
    cursor: Mutex<SequenceNumber>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            cursor: Mutex::new(SequenceNumber::initial()),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Returns the sequence number of the last delivered event.
    pub async fn cursor(&self) -> SequenceNumber {
        *self.cursor.lock().await
    }

    /// Resets all projections and the cursor, then delivers every stored event.
    ///
    /// Returns the number of events delivered.
    #[tracing::instrument(skip(self))]
    pub async fn replay_all(&self) -> Result<u64> {
        let mut cursor = self.cursor.lock().await;

        for projection in &self.projections {
            projection.reset().await?;
        }
        *cursor = SequenceNumber::initial();

        let delivered = self.deliver_after(&mut cursor).await?;
        let position = *cursor;
        tracing::info!(events = delivered, cursor = %position, "replay complete");
        Ok(delivered)
    }

    /// Delivers the events appended since the last delivery.
    ///
    /// Returns the number of events delivered.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_new(&self) -> Result<u64> {
        let mut cursor = self.cursor.lock().await;

        let delivered = self.deliver_after(&mut cursor).await?;
        let position = *cursor;
        if delivered > 0 {
            tracing::info!(events = delivered, cursor = %position, "catch-up complete");
        } else {
            tracing::debug!(cursor = %position, "no new events");
        }
        Ok(delivered)
    }

    /// Delivers a single event to all registered projections.
    ///
    /// Events at or below the cursor were already delivered and are skipped;
    /// returns the number of events delivered (0 or 1).
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type, sequence_number = %event.sequence_number))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<u64> {
        let mut cursor = self.cursor.lock().await;
        if event.sequence_number <= *cursor {
            tracing::debug!(cursor = %cursor.as_i64(), "event already delivered");
            return Ok(0);
        }

        self.deliver(event).await?;
        *cursor = event.sequence_number;
        Ok(1)
    }

    async fn deliver_after(&self, cursor: &mut SequenceNumber) -> Result<u64> {
        let mut stream = self.store.stream_from(*cursor).await?;
        let mut delivered: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            self.deliver(&event).await?;
            *cursor = event.sequence_number;
            delivered += 1;
        }

        Ok(delivered)
    }

    async fn deliver(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            if let Err(err) = projection.handle(event).await {
                tracing::error!(
                    projection = projection.name(),
                    sequence_number = %event.sequence_number,
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    error = %err,
                    "failed to apply event"
                );
                return Err(err);
            }
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectionError;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use common::AggregateId;
    use event_store::InMemoryEventStore;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// A projection recording the sequence numbers it handled.
    struct RecordingProjection {
        seen: Arc<RwLock<Vec<i64>>>,
        position: Arc<RwLock<ProjectionPosition>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingProjection {
        fn new() -> Self {
            Self {
                seen: Arc::new(RwLock::new(Vec::new())),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
                fail_on: None,
            }
        }

        fn failing_on(event_type: &'static str) -> Self {
            Self {
                fail_on: Some(event_type),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Projection for RecordingProjection {
        fn name(&self) -> &'static str {
            "RecordingProjection"
        }

        async fn handle(&self, event: &EventEnvelope) -> Result<()> {
            if self.fail_on == Some(event.event_type.as_str()) {
                return Err(ProjectionError::UnexpectedEvent {
                    event_type: event.event_type.clone(),
                    sequence_number: event.sequence_number.as_i64(),
                });
            }
            self.seen.write().await.push(event.sequence_number.as_i64());
            let mut pos = self.position.write().await;
            *pos = pos.advance(event.sequence_number);
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            self.seen.write().await.clear();
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn create_test_event(event_type: &str) -> EventEnvelope {
        EventEnvelope::builder("Road", AggregateId::new(), event_type)
            .payload_raw(serde_json::json!({"test": true}))
    }

    async fn store_with(event_types: &[&str]) -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        store
            .append(event_types.iter().map(|t| create_test_event(t)).collect())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_replay_delivers_all_events_in_order() {
        let store = store_with(&["Event1", "Event2", "Event3"]).await;
        let projection = RecordingProjection::new();
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        let delivered = processor.replay_all().await.unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(*seen.read().await, vec![1, 2, 3]);
        assert_eq!(processor.cursor().await, SequenceNumber::new(3));
    }

    #[tokio::test]
    async fn test_replay_resets_and_replays() {
        let store = store_with(&["Event1", "Event2"]).await;
        let projection = RecordingProjection::new();
        let seen = Arc::clone(&projection.seen);
        let pos_ref = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        processor.replay_all().await.unwrap();
        processor.replay_all().await.unwrap();

        assert_eq!(*seen.read().await, vec![1, 2]);
        assert_eq!(pos_ref.read().await.events_processed, 2);
    }

    #[tokio::test]
    async fn test_fetch_new_delivers_only_appended_events() {
        let store = store_with(&["Event1", "Event2"]).await;
        let projection = RecordingProjection::new();
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Box::new(projection));

        processor.replay_all().await.unwrap();
        assert_eq!(processor.fetch_new().await.unwrap(), 0);

        store
            .append(vec![create_test_event("Event3"), create_test_event("Event4")])
            .await
            .unwrap();

        assert_eq!(processor.fetch_new().await.unwrap(), 2);
        assert_eq!(*seen.read().await, vec![1, 2, 3, 4]);
        assert_eq!(processor.cursor().await, SequenceNumber::new(4));
    }

    #[tokio::test]
    async fn test_process_event_skips_delivered_events() {
        let store = store_with(&["Event1"]).await;
        let projection = RecordingProjection::new();
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));
        processor.replay_all().await.unwrap();

        let old = EventEnvelope {
            sequence_number: SequenceNumber::new(1),
            ..create_test_event("Event1")
        };
        assert_eq!(processor.process_event(&old).await.unwrap(), 0);

        let new = EventEnvelope {
            sequence_number: SequenceNumber::new(2),
            ..create_test_event("Event2")
        };
        assert_eq!(processor.process_event(&new).await.unwrap(), 1);

        assert_eq!(*seen.read().await, vec![1, 2]);
        assert_eq!(processor.cursor().await, SequenceNumber::new(2));
    }

    #[tokio::test]
    async fn test_failure_stops_delivery_at_last_good_event() {
        let store = store_with(&["Event1", "Poison", "Event3"]).await;
        let projection = RecordingProjection::failing_on("Poison");
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        let err = processor.replay_all().await.unwrap_err();

        assert!(matches!(
            err,
            ProjectionError::UnexpectedEvent {
                sequence_number: 2,
                ..
            }
        ));
        assert_eq!(*seen.read().await, vec![1]);
        assert_eq!(processor.cursor().await, SequenceNumber::new(1));
    }

    #[tokio::test]
    async fn test_empty_store_replay() {
        let projection = RecordingProjection::new();
        let seen = Arc::clone(&projection.seen);

        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(projection));

        assert_eq!(processor.replay_all().await.unwrap(), 0);
        assert!(seen.read().await.is_empty());
        assert_eq!(processor.cursor().await, SequenceNumber::initial());
    }

    #[tokio::test]
    async fn test_multiple_projections() {
        let store = store_with(&["Event1", "Event2"]).await;
        let proj1 = RecordingProjection::new();
        let proj2 = RecordingProjection::new();
        let seen1 = Arc::clone(&proj1.seen);
        let seen2 = Arc::clone(&proj2.seen);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(proj1));
        processor.register(Box::new(proj2));
        assert_eq!(processor.projection_count(), 2);

        processor.replay_all().await.unwrap();

        assert_eq!(*seen1.read().await, vec![1, 2]);
        assert_eq!(*seen2.read().await, vec![1, 2]);
    }
}
