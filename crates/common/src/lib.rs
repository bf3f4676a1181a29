//! Shared identifier types for the address change indexer.

pub mod types;

pub use types::{AccessAddressId, AggregateId, PostCodeId, RoadId, UnitAddressId};
