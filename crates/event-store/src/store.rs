use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventEnvelope, Result, SequenceNumber};

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// The store is an append-only log with a single total order: every event
/// gets a global sequence number, and reads always return events in
/// increasing sequence order. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to the end of the log.
    ///
    /// Events are appended atomically and receive consecutive sequence
    /// numbers in the order given; any sequence number already set on the
    /// envelopes is ignored.
    ///
    /// Returns the sequence number of the last appended event.
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<SequenceNumber>;

    /// Streams every event whose sequence number is greater than `after`,
    /// oldest first.
    ///
    /// `stream_from(SequenceNumber::initial())` replays the whole history.
    async fn stream_from(&self, after: SequenceNumber) -> Result<EventStream>;

    /// Returns the highest assigned sequence number, or
    /// `SequenceNumber::initial()` when the store is empty.
    async fn head(&self) -> Result<SequenceNumber>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the store.
    async fn append_event(&self, event: EventEnvelope) -> Result<SequenceNumber> {
        self.append(vec![event]).await
    }

    /// Streams the whole history.
    async fn stream_all_events(&self) -> Result<EventStream> {
        self.stream_from(SequenceNumber::initial()).await
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for std::sync::Arc<T> {
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<SequenceNumber> {
        (**self).append(events).await
    }

    async fn stream_from(&self, after: SequenceNumber) -> Result<EventStream> {
        (**self).stream_from(after).await
    }

    async fn head(&self) -> Result<SequenceNumber> {
        (**self).head().await
    }
}
