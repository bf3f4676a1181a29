//! Domain layer of the address change indexer.
//!
//! This crate provides the address registry vocabulary:
//! - DomainEvent trait for domain events
//! - AddressEvent, the events published on access address, unit address and road streams
//! - Status enums for access and unit addresses

pub mod address;
pub mod error;
pub mod event;

pub use address::{AccessAddressStatus, AddressEvent, UnitAddressStatus};
pub use error::DomainError;
pub use event::DomainEvent;
