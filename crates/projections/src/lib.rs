//! Address change projection.
//!
//! This crate turns the address registry event stream into change facts:
//! - [`AddressChange`] facts and the [`convert`] functions that build them
//! - [`AddressChangeProjection`], the in-memory view that diffs each event
//!   against current state and fans changes out to unit addresses
//! - [`ProjectionProcessor`] for replaying and catching up from the event store

pub mod change;
pub mod convert;
pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use change::{AddressChange, AddressChangeType, ChangeContext, UnknownChangeType};
pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{AddressChangeProjection, ChangeReceiver, ChangeSender};
