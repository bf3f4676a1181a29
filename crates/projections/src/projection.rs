//! Core projection trait and position tracking.

use async_trait::async_trait;
use event_store::{EventEnvelope, SequenceNumber};

use crate::Result;

/// Tracks how far a projection has come through the event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events handled since the last reset.
    pub events_processed: u64,

    /// Sequence number of the last handled event.
    pub last_sequence_number: SequenceNumber,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position past the event at `sequence_number`.
    pub fn advance(&self, sequence_number: SequenceNumber) -> Self {
        Self {
            events_processed: self.events_processed + 1,
            last_sequence_number: sequence_number,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position({} @ {})",
            self.events_processed, self.last_sequence_number
        )
    }
}

/// A projection that processes events and updates a read model.
///
/// Events are delivered one at a time in sequence order; an implementation
/// never sees two `handle` calls in flight.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_starts_at_zero() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.events_processed, 0);
        assert_eq!(pos.last_sequence_number, SequenceNumber::initial());
    }

    #[test]
    fn test_position_advances_to_sequence_number() {
        let pos = ProjectionPosition::zero().advance(SequenceNumber::new(4));
        assert_eq!(pos.events_processed, 1);
        assert_eq!(pos.last_sequence_number, SequenceNumber::new(4));

        let pos = pos.advance(SequenceNumber::new(9));
        assert_eq!(pos.events_processed, 2);
        assert_eq!(pos.last_sequence_number, SequenceNumber::new(9));
    }

    #[test]
    fn test_position_display() {
        let pos = ProjectionPosition {
            events_processed: 42,
            last_sequence_number: SequenceNumber::new(57),
        };
        assert_eq!(pos.to_string(), "position(42 @ 57)");
    }
}
