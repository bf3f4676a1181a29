//! Address registry domain events.

use chrono::{DateTime, Utc};
use common::{AccessAddressId, AggregateId, PostCodeId, RoadId, UnitAddressId};
use event_store::EventEnvelope;
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::{AccessAddressStatus, UnitAddressStatus};

/// Stream type of access address events.
pub const ACCESS_ADDRESS_AGGREGATE: &str = "AccessAddress";

/// Stream type of unit address events.
pub const UNIT_ADDRESS_AGGREGATE: &str = "UnitAddress";

/// Stream type of road events.
pub const ROAD_AGGREGATE: &str = "Road";

/// Events published by the address registry.
///
/// Every variant name doubles as the event type stored in the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AddressEvent {
    /// An access address was registered.
    AccessAddressCreated(AccessAddressCreatedData),

    /// The municipal code of an access address changed.
    AccessAddressMunicipalCodeChanged(AccessAddressMunicipalCodeChangedData),

    /// The status of an access address changed.
    AccessAddressStatusChanged(AccessAddressStatusChangedData),

    /// The road code of an access address changed.
    AccessAddressRoadCodeChanged(AccessAddressRoadCodeChangedData),

    /// The house number of an access address changed.
    AccessAddressHouseNumberChanged(AccessAddressHouseNumberChangedData),

    /// The supplementary town name of an access address changed.
    AccessAddressSupplementaryTownNameChanged(AccessAddressSupplementaryTownNameChangedData),

    /// The plot id of an access address changed.
    AccessAddressPlotIdChanged(AccessAddressPlotIdChangedData),

    /// The post code of an access address changed.
    AccessAddressPostCodeIdChanged(AccessAddressPostCodeIdChangedData),

    /// An access address was moved to another road.
    AccessAddressRoadIdChanged(AccessAddressRoadIdChangedData),

    /// The coordinate of an access address changed.
    AccessAddressCoordinateChanged(AccessAddressCoordinateChangedData),

    /// An access address was deleted.
    AccessAddressDeleted(AccessAddressDeletedData),

    /// A unit address was registered.
    UnitAddressCreated(UnitAddressCreatedData),

    /// A unit address was moved to another access address.
    UnitAddressAccessAddressIdChanged(UnitAddressAccessAddressIdChangedData),

    /// The status of a unit address changed.
    UnitAddressStatusChanged(UnitAddressStatusChangedData),

    /// The floor name of a unit address changed.
    UnitAddressFloorNameChanged(UnitAddressFloorNameChangedData),

    /// The suite name of a unit address changed.
    UnitAddressSuiteNameChanged(UnitAddressSuiteNameChangedData),

    /// A unit address was deleted.
    UnitAddressDeleted(UnitAddressDeletedData),

    /// A road was registered.
    RoadCreated(RoadCreatedData),

    /// A road was renamed.
    RoadNameChanged(RoadNameChangedData),

    /// A road was deleted.
    RoadDeleted(RoadDeletedData),
}

impl DomainEvent for AddressEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AddressEvent::AccessAddressCreated(_) => "AccessAddressCreated",
            AddressEvent::AccessAddressMunicipalCodeChanged(_) => {
                "AccessAddressMunicipalCodeChanged"
            }
            AddressEvent::AccessAddressStatusChanged(_) => "AccessAddressStatusChanged",
            AddressEvent::AccessAddressRoadCodeChanged(_) => "AccessAddressRoadCodeChanged",
            AddressEvent::AccessAddressHouseNumberChanged(_) => "AccessAddressHouseNumberChanged",
            AddressEvent::AccessAddressSupplementaryTownNameChanged(_) => {
                "AccessAddressSupplementaryTownNameChanged"
            }
            AddressEvent::AccessAddressPlotIdChanged(_) => "AccessAddressPlotIdChanged",
            AddressEvent::AccessAddressPostCodeIdChanged(_) => "AccessAddressPostCodeIdChanged",
            AddressEvent::AccessAddressRoadIdChanged(_) => "AccessAddressRoadIdChanged",
            AddressEvent::AccessAddressCoordinateChanged(_) => "AccessAddressCoordinateChanged",
            AddressEvent::AccessAddressDeleted(_) => "AccessAddressDeleted",
            AddressEvent::UnitAddressCreated(_) => "UnitAddressCreated",
            AddressEvent::UnitAddressAccessAddressIdChanged(_) => {
                "UnitAddressAccessAddressIdChanged"
            }
            AddressEvent::UnitAddressStatusChanged(_) => "UnitAddressStatusChanged",
            AddressEvent::UnitAddressFloorNameChanged(_) => "UnitAddressFloorNameChanged",
            AddressEvent::UnitAddressSuiteNameChanged(_) => "UnitAddressSuiteNameChanged",
            AddressEvent::UnitAddressDeleted(_) => "UnitAddressDeleted",
            AddressEvent::RoadCreated(_) => "RoadCreated",
            AddressEvent::RoadNameChanged(_) => "RoadNameChanged",
            AddressEvent::RoadDeleted(_) => "RoadDeleted",
        }
    }

    fn aggregate_type(&self) -> &'static str {
        match self {
            AddressEvent::AccessAddressCreated(_)
            | AddressEvent::AccessAddressMunicipalCodeChanged(_)
            | AddressEvent::AccessAddressStatusChanged(_)
            | AddressEvent::AccessAddressRoadCodeChanged(_)
            | AddressEvent::AccessAddressHouseNumberChanged(_)
            | AddressEvent::AccessAddressSupplementaryTownNameChanged(_)
            | AddressEvent::AccessAddressPlotIdChanged(_)
            | AddressEvent::AccessAddressPostCodeIdChanged(_)
            | AddressEvent::AccessAddressRoadIdChanged(_)
            | AddressEvent::AccessAddressCoordinateChanged(_)
            | AddressEvent::AccessAddressDeleted(_) => ACCESS_ADDRESS_AGGREGATE,
            AddressEvent::UnitAddressCreated(_)
            | AddressEvent::UnitAddressAccessAddressIdChanged(_)
            | AddressEvent::UnitAddressStatusChanged(_)
            | AddressEvent::UnitAddressFloorNameChanged(_)
            | AddressEvent::UnitAddressSuiteNameChanged(_)
            | AddressEvent::UnitAddressDeleted(_) => UNIT_ADDRESS_AGGREGATE,
            AddressEvent::RoadCreated(_)
            | AddressEvent::RoadNameChanged(_)
            | AddressEvent::RoadDeleted(_) => ROAD_AGGREGATE,
        }
    }

    fn aggregate_id(&self) -> AggregateId {
        match self {
            AddressEvent::AccessAddressCreated(data) => data.id.into(),
            AddressEvent::AccessAddressMunicipalCodeChanged(data) => data.id.into(),
            AddressEvent::AccessAddressStatusChanged(data) => data.id.into(),
            AddressEvent::AccessAddressRoadCodeChanged(data) => data.id.into(),
            AddressEvent::AccessAddressHouseNumberChanged(data) => data.id.into(),
            AddressEvent::AccessAddressSupplementaryTownNameChanged(data) => data.id.into(),
            AddressEvent::AccessAddressPlotIdChanged(data) => data.id.into(),
            AddressEvent::AccessAddressPostCodeIdChanged(data) => data.id.into(),
            AddressEvent::AccessAddressRoadIdChanged(data) => data.id.into(),
            AddressEvent::AccessAddressCoordinateChanged(data) => data.id.into(),
            AddressEvent::AccessAddressDeleted(data) => data.id.into(),
            AddressEvent::UnitAddressCreated(data) => data.id.into(),
            AddressEvent::UnitAddressAccessAddressIdChanged(data) => data.id.into(),
            AddressEvent::UnitAddressStatusChanged(data) => data.id.into(),
            AddressEvent::UnitAddressFloorNameChanged(data) => data.id.into(),
            AddressEvent::UnitAddressSuiteNameChanged(data) => data.id.into(),
            AddressEvent::UnitAddressDeleted(data) => data.id.into(),
            AddressEvent::RoadCreated(data) => data.id.into(),
            AddressEvent::RoadNameChanged(data) => data.id.into(),
            AddressEvent::RoadDeleted(data) => data.id.into(),
        }
    }
}

impl AddressEvent {
    /// Every event type name an address stream may carry.
    pub const EVENT_TYPES: [&'static str; 20] = [
        "AccessAddressCreated",
        "AccessAddressMunicipalCodeChanged",
        "AccessAddressStatusChanged",
        "AccessAddressRoadCodeChanged",
        "AccessAddressHouseNumberChanged",
        "AccessAddressSupplementaryTownNameChanged",
        "AccessAddressPlotIdChanged",
        "AccessAddressPostCodeIdChanged",
        "AccessAddressRoadIdChanged",
        "AccessAddressCoordinateChanged",
        "AccessAddressDeleted",
        "UnitAddressCreated",
        "UnitAddressAccessAddressIdChanged",
        "UnitAddressStatusChanged",
        "UnitAddressFloorNameChanged",
        "UnitAddressSuiteNameChanged",
        "UnitAddressDeleted",
        "RoadCreated",
        "RoadNameChanged",
        "RoadDeleted",
    ];

    /// Returns true if `event_type` names one of the address events.
    pub fn is_known_event_type(event_type: &str) -> bool {
        Self::EVENT_TYPES.contains(&event_type)
    }

    /// Returns true if envelopes of this stream type carry address events.
    pub fn is_address_aggregate(aggregate_type: &str) -> bool {
        matches!(
            aggregate_type,
            ACCESS_ADDRESS_AGGREGATE | UNIT_ADDRESS_AGGREGATE | ROAD_AGGREGATE
        )
    }

    /// Returns the timestamp the upstream registry reported for this change.
    pub fn external_updated(&self) -> Option<DateTime<Utc>> {
        match self {
            AddressEvent::AccessAddressCreated(data) => data.external_updated,
            AddressEvent::AccessAddressMunicipalCodeChanged(data) => data.external_updated,
            AddressEvent::AccessAddressStatusChanged(data) => data.external_updated,
            AddressEvent::AccessAddressRoadCodeChanged(data) => data.external_updated,
            AddressEvent::AccessAddressHouseNumberChanged(data) => data.external_updated,
            AddressEvent::AccessAddressSupplementaryTownNameChanged(data) => {
                data.external_updated
            }
            AddressEvent::AccessAddressPlotIdChanged(data) => data.external_updated,
            AddressEvent::AccessAddressPostCodeIdChanged(data) => data.external_updated,
            AddressEvent::AccessAddressRoadIdChanged(data) => data.external_updated,
            AddressEvent::AccessAddressCoordinateChanged(data) => data.external_updated,
            AddressEvent::AccessAddressDeleted(data) => data.external_updated,
            AddressEvent::UnitAddressCreated(data) => data.external_updated,
            AddressEvent::UnitAddressAccessAddressIdChanged(data) => data.external_updated,
            AddressEvent::UnitAddressStatusChanged(data) => data.external_updated,
            AddressEvent::UnitAddressFloorNameChanged(data) => data.external_updated,
            AddressEvent::UnitAddressSuiteNameChanged(data) => data.external_updated,
            AddressEvent::UnitAddressDeleted(data) => data.external_updated,
            AddressEvent::RoadCreated(data) => data.external_updated,
            AddressEvent::RoadNameChanged(data) => data.external_updated,
            AddressEvent::RoadDeleted(data) => data.external_updated,
        }
    }

    /// Wraps the event in an envelope ready to be appended to the event store.
    pub fn to_envelope(&self) -> Result<EventEnvelope, serde_json::Error> {
        EventEnvelope::builder(
            DomainEvent::aggregate_type(self),
            DomainEvent::aggregate_id(self),
            DomainEvent::event_type(self),
        )
        .payload(self)
    }

    /// Decodes the payload of a stored envelope.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Self, serde_json::Error> {
        serde_json::from_value(envelope.payload.clone())
    }
}

/// Data for AccessAddressCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressCreatedData {
    pub id: AccessAddressId,
    pub municipal_code: String,
    pub status: AccessAddressStatus,
    pub road_code: String,
    pub house_number: String,
    pub post_code_id: PostCodeId,
    pub east_coordinate: f64,
    pub north_coordinate: f64,
    pub supplementary_town_name: Option<String>,
    pub plot_id: Option<String>,
    pub road_id: RoadId,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressMunicipalCodeChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressMunicipalCodeChangedData {
    pub id: AccessAddressId,
    pub municipal_code: String,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressStatusChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressStatusChangedData {
    pub id: AccessAddressId,
    pub status: AccessAddressStatus,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressRoadCodeChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressRoadCodeChangedData {
    pub id: AccessAddressId,
    pub road_code: String,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressHouseNumberChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressHouseNumberChangedData {
    pub id: AccessAddressId,
    pub house_number: String,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressSupplementaryTownNameChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressSupplementaryTownNameChangedData {
    pub id: AccessAddressId,
    pub supplementary_town_name: Option<String>,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressPlotIdChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressPlotIdChangedData {
    pub id: AccessAddressId,
    pub plot_id: Option<String>,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressPostCodeIdChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressPostCodeIdChangedData {
    pub id: AccessAddressId,
    pub post_code_id: PostCodeId,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressRoadIdChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressRoadIdChangedData {
    pub id: AccessAddressId,
    pub road_id: RoadId,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressCoordinateChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressCoordinateChangedData {
    pub id: AccessAddressId,
    pub east_coordinate: f64,
    pub north_coordinate: f64,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for AccessAddressDeleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessAddressDeletedData {
    pub id: AccessAddressId,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for UnitAddressCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressCreatedData {
    pub id: UnitAddressId,
    pub access_address_id: AccessAddressId,
    pub status: UnitAddressStatus,
    pub floor_name: Option<String>,
    pub suite_name: Option<String>,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for UnitAddressAccessAddressIdChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressAccessAddressIdChangedData {
    pub id: UnitAddressId,
    pub access_address_id: AccessAddressId,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for UnitAddressStatusChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressStatusChangedData {
    pub id: UnitAddressId,
    pub status: UnitAddressStatus,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for UnitAddressFloorNameChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressFloorNameChangedData {
    pub id: UnitAddressId,
    pub floor_name: Option<String>,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for UnitAddressSuiteNameChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressSuiteNameChangedData {
    pub id: UnitAddressId,
    pub suite_name: Option<String>,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for UnitAddressDeleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAddressDeletedData {
    pub id: UnitAddressId,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for RoadCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadCreatedData {
    pub id: RoadId,
    pub name: String,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for RoadNameChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadNameChangedData {
    pub id: RoadId,
    pub name: String,
    pub external_updated: Option<DateTime<Utc>>,
}

/// Data for RoadDeleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadDeletedData {
    pub id: RoadId,
    pub external_updated: Option<DateTime<Utc>>,
}

// Convenience constructors for events. All of them leave `external_updated`
// unset; build the data structs directly when it matters.
impl AddressEvent {
    /// Creates a RoadCreated event.
    pub fn road_created(id: RoadId, name: impl Into<String>) -> Self {
        AddressEvent::RoadCreated(RoadCreatedData {
            id,
            name: name.into(),
            external_updated: None,
        })
    }

    /// Creates a RoadNameChanged event.
    pub fn road_name_changed(id: RoadId, name: impl Into<String>) -> Self {
        AddressEvent::RoadNameChanged(RoadNameChangedData {
            id,
            name: name.into(),
            external_updated: None,
        })
    }

    /// Creates a RoadDeleted event.
    pub fn road_deleted(id: RoadId) -> Self {
        AddressEvent::RoadDeleted(RoadDeletedData {
            id,
            external_updated: None,
        })
    }

    /// Creates an AccessAddressMunicipalCodeChanged event.
    pub fn access_address_municipal_code_changed(
        id: AccessAddressId,
        municipal_code: impl Into<String>,
    ) -> Self {
        AddressEvent::AccessAddressMunicipalCodeChanged(AccessAddressMunicipalCodeChangedData {
            id,
            municipal_code: municipal_code.into(),
            external_updated: None,
        })
    }

    /// Creates an AccessAddressStatusChanged event.
    pub fn access_address_status_changed(id: AccessAddressId, status: AccessAddressStatus) -> Self {
        AddressEvent::AccessAddressStatusChanged(AccessAddressStatusChangedData {
            id,
            status,
            external_updated: None,
        })
    }

    /// Creates an AccessAddressRoadCodeChanged event.
    pub fn access_address_road_code_changed(
        id: AccessAddressId,
        road_code: impl Into<String>,
    ) -> Self {
        AddressEvent::AccessAddressRoadCodeChanged(AccessAddressRoadCodeChangedData {
            id,
            road_code: road_code.into(),
            external_updated: None,
        })
    }

    /// Creates an AccessAddressHouseNumberChanged event.
    pub fn access_address_house_number_changed(
        id: AccessAddressId,
        house_number: impl Into<String>,
    ) -> Self {
        AddressEvent::AccessAddressHouseNumberChanged(AccessAddressHouseNumberChangedData {
            id,
            house_number: house_number.into(),
            external_updated: None,
        })
    }

    /// Creates an AccessAddressSupplementaryTownNameChanged event.
    pub fn access_address_supplementary_town_name_changed(
        id: AccessAddressId,
        supplementary_town_name: Option<String>,
    ) -> Self {
        AddressEvent::AccessAddressSupplementaryTownNameChanged(
            AccessAddressSupplementaryTownNameChangedData {
                id,
                supplementary_town_name,
                external_updated: None,
            },
        )
    }

    /// Creates an AccessAddressPlotIdChanged event.
    pub fn access_address_plot_id_changed(id: AccessAddressId, plot_id: Option<String>) -> Self {
        AddressEvent::AccessAddressPlotIdChanged(AccessAddressPlotIdChangedData {
            id,
            plot_id,
            external_updated: None,
        })
    }

    /// Creates an AccessAddressPostCodeIdChanged event.
    pub fn access_address_post_code_id_changed(
        id: AccessAddressId,
        post_code_id: PostCodeId,
    ) -> Self {
        AddressEvent::AccessAddressPostCodeIdChanged(AccessAddressPostCodeIdChangedData {
            id,
            post_code_id,
            external_updated: None,
        })
    }

    /// Creates an AccessAddressRoadIdChanged event.
    pub fn access_address_road_id_changed(id: AccessAddressId, road_id: RoadId) -> Self {
        AddressEvent::AccessAddressRoadIdChanged(AccessAddressRoadIdChangedData {
            id,
            road_id,
            external_updated: None,
        })
    }

    /// Creates an AccessAddressCoordinateChanged event.
    pub fn access_address_coordinate_changed(
        id: AccessAddressId,
        east_coordinate: f64,
        north_coordinate: f64,
    ) -> Self {
        AddressEvent::AccessAddressCoordinateChanged(AccessAddressCoordinateChangedData {
            id,
            east_coordinate,
            north_coordinate,
            external_updated: None,
        })
    }

    /// Creates an AccessAddressDeleted event.
    pub fn access_address_deleted(id: AccessAddressId) -> Self {
        AddressEvent::AccessAddressDeleted(AccessAddressDeletedData {
            id,
            external_updated: None,
        })
    }

    /// Creates a UnitAddressCreated event for an active unit without floor or suite.
    pub fn unit_address_created(id: UnitAddressId, access_address_id: AccessAddressId) -> Self {
        AddressEvent::UnitAddressCreated(UnitAddressCreatedData {
            id,
            access_address_id,
            status: UnitAddressStatus::Active,
            floor_name: None,
            suite_name: None,
            external_updated: None,
        })
    }

    /// Creates a UnitAddressAccessAddressIdChanged event.
    pub fn unit_address_access_address_id_changed(
        id: UnitAddressId,
        access_address_id: AccessAddressId,
    ) -> Self {
        AddressEvent::UnitAddressAccessAddressIdChanged(UnitAddressAccessAddressIdChangedData {
            id,
            access_address_id,
            external_updated: None,
        })
    }

    /// Creates a UnitAddressStatusChanged event.
    pub fn unit_address_status_changed(id: UnitAddressId, status: UnitAddressStatus) -> Self {
        AddressEvent::UnitAddressStatusChanged(UnitAddressStatusChangedData {
            id,
            status,
            external_updated: None,
        })
    }

    /// Creates a UnitAddressFloorNameChanged event.
    pub fn unit_address_floor_name_changed(id: UnitAddressId, floor_name: Option<String>) -> Self {
        AddressEvent::UnitAddressFloorNameChanged(UnitAddressFloorNameChangedData {
            id,
            floor_name,
            external_updated: None,
        })
    }

    /// Creates a UnitAddressSuiteNameChanged event.
    pub fn unit_address_suite_name_changed(id: UnitAddressId, suite_name: Option<String>) -> Self {
        AddressEvent::UnitAddressSuiteNameChanged(UnitAddressSuiteNameChangedData {
            id,
            suite_name,
            external_updated: None,
        })
    }

    /// Creates a UnitAddressDeleted event.
    pub fn unit_address_deleted(id: UnitAddressId) -> Self {
        AddressEvent::UnitAddressDeleted(UnitAddressDeletedData {
            id,
            external_updated: None,
        })
    }
}
