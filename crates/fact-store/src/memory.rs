use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use event_store::SequenceNumber;
use projections::AddressChange;
use tokio::sync::RwLock;

use crate::sink::{FactKey, FactSink, fact_key};
use crate::{FactStoreError, Result};

#[derive(Default)]
struct Table {
    schema_ready: bool,
    rows: Vec<AddressChange>,
    keys: HashSet<FactKey>,
    inserts: usize,
}

/// In-memory fact sink for testing.
///
/// Enforces the same primary key as the PostgreSQL table and rejects a batch
/// containing any duplicate without storing any of it.
#[derive(Clone, Default)]
pub struct InMemoryFactSink {
    table: Arc<RwLock<Table>>,
}

impl InMemoryFactSink {
    /// Creates a new empty in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all stored facts in insertion order.
    pub async fn changes(&self) -> Vec<AddressChange> {
        self.table.read().await.rows.clone()
    }

    /// Returns the number of stored facts.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the number of successful `bulk_insert` calls.
    pub async fn insert_count(&self) -> usize {
        self.table.read().await.inserts
    }

    /// Returns true once `ensure_schema` has been called.
    pub async fn schema_ready(&self) -> bool {
        self.table.read().await.schema_ready
    }
}

#[async_trait]
impl FactSink for InMemoryFactSink {
    async fn ensure_schema(&self) -> Result<()> {
        self.table.write().await.schema_ready = true;
        Ok(())
    }

    async fn highest_sequence_number(&self) -> Result<SequenceNumber> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .map(|change| change.sequence_number)
            .max()
            .unwrap_or_default())
    }

    async fn bulk_insert(&self, changes: &[AddressChange]) -> Result<()> {
        let mut table = self.table.write().await;

        let mut batch_keys = HashSet::with_capacity(changes.len());
        for change in changes {
            let key = fact_key(change);
            if table.keys.contains(&key) || !batch_keys.insert(key) {
                return Err(FactStoreError::DuplicateFact(format!(
                    "({}, {}, {})",
                    change.unit_address_id, change.event_id, change.change_type
                )));
            }
        }

        table.keys.extend(batch_keys);
        table.rows.extend_from_slice(changes);
        table.inserts += 1;
        Ok(())
    }
}
