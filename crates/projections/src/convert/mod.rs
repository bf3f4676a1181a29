//! Field-level diff converters.
//!
//! Each function turns one before/after pair into a single [`AddressChange`]
//! with canonical string encoding. They never fail.
//!
//! [`AddressChange`]: crate::change::AddressChange

pub mod access_address;
pub mod road;
pub mod unit_address;
