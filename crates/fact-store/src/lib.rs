//! Fact sink for address change facts.
//!
//! A [`FactSink`] stores [`AddressChange`](projections::AddressChange) rows
//! and reports the highest stored sequence number, which the indexer uses as
//! its restart watermark.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod sink;

pub use error::{FactStoreError, Result};
pub use memory::InMemoryFactSink;
pub use postgres::PostgresFactSink;
pub use sink::{FactKey, FactSink};
