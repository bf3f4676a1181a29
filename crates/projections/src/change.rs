//! Normalized change facts emitted by the address change projection.

use chrono::{DateTime, Utc};
use common::UnitAddressId;
use event_store::{EventEnvelope, EventId, SequenceNumber};
use serde::{Deserialize, Serialize};

/// Kind of mutation an [`AddressChange`] records.
///
/// Stored by its variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddressChangeType {
    UnitAddressCreated,
    UnitAddressAccessAddressIdChanged,
    UnitAddressStatusChanged,
    UnitAddressFloorNameChanged,
    UnitAddressSuiteNameChanged,
    UnitAddressDeleted,
    AccessAddressMunicipalCodeChanged,
    AccessAddressStatusChanged,
    AccessAddressRoadCodeChanged,
    AccessAddressHouseNumberChanged,
    AccessAddressSupplementaryTownNameChanged,
    AccessAddressPlotIdChanged,
    AccessAddressPostCodeIdChanged,
    AccessAddressCoordinateChanged,
    AccessAddressRoadIdChanged,
    /// Road id changed and the new road carries a different name.
    AccessAddressRoadNameChanged,
    AccessAddressDeleted,
    RoadNameChanged,
}

impl AddressChangeType {
    /// Every change type, in declaration order.
    pub const ALL: [AddressChangeType; 18] = [
        AddressChangeType::UnitAddressCreated,
        AddressChangeType::UnitAddressAccessAddressIdChanged,
        AddressChangeType::UnitAddressStatusChanged,
        AddressChangeType::UnitAddressFloorNameChanged,
        AddressChangeType::UnitAddressSuiteNameChanged,
        AddressChangeType::UnitAddressDeleted,
        AddressChangeType::AccessAddressMunicipalCodeChanged,
        AddressChangeType::AccessAddressStatusChanged,
        AddressChangeType::AccessAddressRoadCodeChanged,
        AddressChangeType::AccessAddressHouseNumberChanged,
        AddressChangeType::AccessAddressSupplementaryTownNameChanged,
        AddressChangeType::AccessAddressPlotIdChanged,
        AddressChangeType::AccessAddressPostCodeIdChanged,
        AddressChangeType::AccessAddressCoordinateChanged,
        AddressChangeType::AccessAddressRoadIdChanged,
        AddressChangeType::AccessAddressRoadNameChanged,
        AddressChangeType::AccessAddressDeleted,
        AddressChangeType::RoadNameChanged,
    ];

    /// Returns the stored name of the change type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressChangeType::UnitAddressCreated => "UnitAddressCreated",
            AddressChangeType::UnitAddressAccessAddressIdChanged => {
                "UnitAddressAccessAddressIdChanged"
            }
            AddressChangeType::UnitAddressStatusChanged => "UnitAddressStatusChanged",
            AddressChangeType::UnitAddressFloorNameChanged => "UnitAddressFloorNameChanged",
            AddressChangeType::UnitAddressSuiteNameChanged => "UnitAddressSuiteNameChanged",
            AddressChangeType::UnitAddressDeleted => "UnitAddressDeleted",
            AddressChangeType::AccessAddressMunicipalCodeChanged => {
                "AccessAddressMunicipalCodeChanged"
            }
            AddressChangeType::AccessAddressStatusChanged => "AccessAddressStatusChanged",
            AddressChangeType::AccessAddressRoadCodeChanged => "AccessAddressRoadCodeChanged",
            AddressChangeType::AccessAddressHouseNumberChanged => {
                "AccessAddressHouseNumberChanged"
            }
            AddressChangeType::AccessAddressSupplementaryTownNameChanged => {
                "AccessAddressSupplementaryTownNameChanged"
            }
            AddressChangeType::AccessAddressPlotIdChanged => "AccessAddressPlotIdChanged",
            AddressChangeType::AccessAddressPostCodeIdChanged => "AccessAddressPostCodeIdChanged",
            AddressChangeType::AccessAddressCoordinateChanged => "AccessAddressCoordinateChanged",
            AddressChangeType::AccessAddressRoadIdChanged => "AccessAddressRoadIdChanged",
            AddressChangeType::AccessAddressRoadNameChanged => "AccessAddressRoadNameChanged",
            AddressChangeType::AccessAddressDeleted => "AccessAddressDeleted",
            AddressChangeType::RoadNameChanged => "RoadNameChanged",
        }
    }
}

impl std::fmt::Display for AddressChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown change type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown address change type: {0}")]
pub struct UnknownChangeType(pub String);

impl std::str::FromStr for AddressChangeType {
    type Err = UnknownChangeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressChangeType::ALL
            .into_iter()
            .find(|change_type| change_type.as_str() == s)
            .ok_or_else(|| UnknownChangeType(s.to_string()))
    }
}

/// A single, immutable fact describing one mutation of a unit address.
///
/// `before` and `after` hold the string-encoded field values: enum names,
/// hyphenated UUIDs, or `"east,north"` coordinate pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressChange {
    /// The unit address the fact is about.
    pub unit_address_id: UnitAddressId,

    /// The event that caused the change.
    pub event_id: EventId,

    /// Global position of the causing event.
    pub sequence_number: SequenceNumber,

    pub change_type: AddressChangeType,

    /// When the causing event was recorded.
    pub event_timestamp: DateTime<Utc>,

    /// When the upstream registry last updated the entity, if known.
    pub external_updated: Option<DateTime<Utc>>,

    /// Straight-line distance moved, only set for coordinate changes.
    pub moved_distance_meters: Option<f64>,

    pub before: Option<String>,
    pub after: Option<String>,
}

/// Identifiers shared by every fact produced from one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeContext {
    pub unit_address_id: UnitAddressId,
    pub event_id: EventId,
    pub sequence_number: SequenceNumber,
    pub event_timestamp: DateTime<Utc>,
    pub external_updated: Option<DateTime<Utc>>,
}

impl ChangeContext {
    /// Creates a context for facts about `unit_address_id` caused by `envelope`.
    pub fn new(
        envelope: &EventEnvelope,
        unit_address_id: UnitAddressId,
        external_updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            unit_address_id,
            event_id: envelope.event_id,
            sequence_number: envelope.sequence_number,
            event_timestamp: envelope.timestamp,
            external_updated,
        }
    }

    /// Returns the same context addressed to another unit address.
    pub fn for_unit_address(self, unit_address_id: UnitAddressId) -> Self {
        Self {
            unit_address_id,
            ..self
        }
    }

    /// Builds a fact of the given kind from this context.
    pub fn change(
        &self,
        change_type: AddressChangeType,
        before: Option<String>,
        after: Option<String>,
    ) -> AddressChange {
        AddressChange {
            unit_address_id: self.unit_address_id,
            event_id: self.event_id,
            sequence_number: self.sequence_number,
            change_type,
            event_timestamp: self.event_timestamp,
            external_updated: self.external_updated,
            moved_distance_meters: None,
            before,
            after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;

    #[test]
    fn test_change_type_names_parse_back() {
        for change_type in AddressChangeType::ALL {
            let parsed: AddressChangeType = change_type.to_string().parse().unwrap();
            assert_eq!(parsed, change_type);
        }
    }

    #[test]
    fn test_change_type_rejects_unknown_name() {
        let err = "AddressCreated".parse::<AddressChangeType>().unwrap_err();
        assert_eq!(err, UnknownChangeType("AddressCreated".to_string()));
    }

    #[test]
    fn test_change_type_serializes_as_name() {
        let json = serde_json::to_string(&AddressChangeType::RoadNameChanged).unwrap();
        assert_eq!(json, "\"RoadNameChanged\"");
    }

    #[test]
    fn test_context_carries_envelope_identifiers() {
        let envelope = EventEnvelope::builder("Road", AggregateId::new(), "RoadNameChanged")
            .sequence_number(SequenceNumber::new(7))
            .payload_raw(serde_json::json!({}));
        let first = UnitAddressId::new();
        let second = UnitAddressId::new();

        let ctx = ChangeContext::new(&envelope, first, None);
        let change = ctx.for_unit_address(second).change(
            AddressChangeType::RoadNameChanged,
            Some("Vejlevej".to_string()),
            Some("Fredericiavej".to_string()),
        );

        assert_eq!(change.unit_address_id, second);
        assert_eq!(change.event_id, envelope.event_id);
        assert_eq!(change.sequence_number, SequenceNumber::new(7));
        assert_eq!(change.event_timestamp, envelope.timestamp);
        assert_eq!(change.moved_distance_meters, None);
    }
}
