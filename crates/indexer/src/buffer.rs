//! Bounded FIFO buffer between the projection output and the flusher.

use projections::AddressChange;
use tokio::sync::{Mutex, Semaphore};

use crate::{IndexerError, Result};

/// Buffered facts plus the admission permits they hold.
struct Buffered {
    changes: Vec<AddressChange>,
    permits: u32,
}

/// Buffer of pending facts with back-pressure measured in facts.
///
/// Admission is tracked with a semaphore holding one permit per free slot. A
/// group larger than the whole capacity takes every permit, so it is admitted
/// only once the buffer is empty. Groups are never split.
pub struct BatchBuffer {
    capacity: u32,
    slots: Semaphore,
    buffered: Mutex<Buffered>,
}

impl BatchBuffer {
    /// Creates a buffer holding up to `capacity` facts (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity
            .clamp(1, Semaphore::MAX_PERMITS)
            .min(u32::MAX as usize) as u32;
        Self {
            capacity,
            slots: Semaphore::new(capacity as usize),
            buffered: Mutex::new(Buffered {
                changes: Vec::new(),
                permits: 0,
            }),
        }
    }

    /// Returns the capacity in facts.
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Returns the number of buffered facts.
    pub async fn len(&self) -> usize {
        self.buffered.lock().await.changes.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Appends a group of facts, waiting while the buffer is full.
    ///
    /// Cancel safe: a push dropped while waiting leaves the buffer unchanged.
    pub async fn push(&self, group: Vec<AddressChange>) -> Result<()> {
        if group.is_empty() {
            return Ok(());
        }

        let needed = u32::try_from(group.len())
            .unwrap_or(u32::MAX)
            .min(self.capacity);
        let permit = self
            .slots
            .acquire_many(needed)
            .await
            .map_err(|_| IndexerError::BufferClosed)?;
        permit.forget();

        let mut buffered = self.buffered.lock().await;
        buffered.changes.extend(group);
        buffered.permits += needed;
        Ok(())
    }

    /// Removes and returns everything buffered, oldest first.
    pub async fn take(&self) -> Vec<AddressChange> {
        let mut buffered = self.buffered.lock().await;
        let released = std::mem::take(&mut buffered.permits);
        let changes = std::mem::take(&mut buffered.changes);
        self.slots.add_permits(released as usize);
        changes
    }
}
