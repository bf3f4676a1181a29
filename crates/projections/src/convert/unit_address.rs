//! Converters for unit address mutations.

use common::AccessAddressId;
use domain::UnitAddressStatus;

use crate::change::{AddressChange, AddressChangeType, ChangeContext};

pub fn created(ctx: &ChangeContext) -> AddressChange {
    ctx.change(AddressChangeType::UnitAddressCreated, None, None)
}

pub fn access_address_id_changed(
    ctx: &ChangeContext,
    before: AccessAddressId,
    after: AccessAddressId,
) -> AddressChange {
    ctx.change(
        AddressChangeType::UnitAddressAccessAddressIdChanged,
        Some(before.to_string()),
        Some(after.to_string()),
    )
}

pub fn status_changed(
    ctx: &ChangeContext,
    before: UnitAddressStatus,
    after: UnitAddressStatus,
) -> AddressChange {
    ctx.change(
        AddressChangeType::UnitAddressStatusChanged,
        Some(before.as_str().to_string()),
        Some(after.as_str().to_string()),
    )
}

pub fn floor_name_changed(
    ctx: &ChangeContext,
    before: Option<&str>,
    after: Option<&str>,
) -> AddressChange {
    ctx.change(
        AddressChangeType::UnitAddressFloorNameChanged,
        before.map(str::to_string),
        after.map(str::to_string),
    )
}

pub fn suite_name_changed(
    ctx: &ChangeContext,
    before: Option<&str>,
    after: Option<&str>,
) -> AddressChange {
    ctx.change(
        AddressChangeType::UnitAddressSuiteNameChanged,
        before.map(str::to_string),
        after.map(str::to_string),
    )
}

pub fn deleted(ctx: &ChangeContext) -> AddressChange {
    ctx.change(AddressChangeType::UnitAddressDeleted, None, None)
}
