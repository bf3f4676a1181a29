//! Access addresses, unit addresses and roads as published by the address registry.

mod events;
mod status;

pub use events::{
    ACCESS_ADDRESS_AGGREGATE, AccessAddressCoordinateChangedData, AccessAddressCreatedData,
    AccessAddressDeletedData, AccessAddressHouseNumberChangedData,
    AccessAddressMunicipalCodeChangedData, AccessAddressPlotIdChangedData,
    AccessAddressPostCodeIdChangedData, AccessAddressRoadCodeChangedData,
    AccessAddressRoadIdChangedData, AccessAddressStatusChangedData,
    AccessAddressSupplementaryTownNameChangedData, AddressEvent, ROAD_AGGREGATE, RoadCreatedData,
    RoadDeletedData, RoadNameChangedData, UNIT_ADDRESS_AGGREGATE,
    UnitAddressAccessAddressIdChangedData, UnitAddressCreatedData, UnitAddressDeletedData,
    UnitAddressFloorNameChangedData, UnitAddressStatusChangedData, UnitAddressSuiteNameChangedData,
};
pub use status::{AccessAddressStatus, UnitAddressStatus};
