//! Materialized views fed by the projection processor.

pub mod address_change;

pub use address_change::{
    AccessAddress, AddressChangeProjection, ChangeReceiver, ChangeSender, UnitAddress,
};
