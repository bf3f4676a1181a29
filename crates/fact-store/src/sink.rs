//! The fact sink trait.

use std::sync::Arc;

use async_trait::async_trait;
use common::UnitAddressId;
use event_store::{EventId, SequenceNumber};
use projections::{AddressChange, AddressChangeType};

use crate::Result;

/// Primary key of a stored fact.
pub type FactKey = (UnitAddressId, EventId, AddressChangeType);

/// Returns the primary key of a fact.
pub fn fact_key(change: &AddressChange) -> FactKey {
    (change.unit_address_id, change.event_id, change.change_type)
}

/// Durable destination of address change facts.
#[async_trait]
pub trait FactSink: Send + Sync {
    /// Creates the schema and table if they do not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Returns the highest stored sequence number, or `SequenceNumber::initial()`
    /// if nothing has been stored.
    async fn highest_sequence_number(&self) -> Result<SequenceNumber>;

    /// Stores all facts or none of them.
    async fn bulk_insert(&self, changes: &[AddressChange]) -> Result<()>;
}

#[async_trait]
impl<T: FactSink + ?Sized> FactSink for Arc<T> {
    async fn ensure_schema(&self) -> Result<()> {
        (**self).ensure_schema().await
    }

    async fn highest_sequence_number(&self) -> Result<SequenceNumber> {
        (**self).highest_sequence_number().await
    }

    async fn bulk_insert(&self, changes: &[AddressChange]) -> Result<()> {
        (**self).bulk_insert(changes).await
    }
}
