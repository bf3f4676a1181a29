//! Converters for access address mutations.
//!
//! An access address change is reported once per unit address attached to
//! it, so every converter takes the context of one dependent unit address.

use common::{PostCodeId, RoadId};
use domain::AccessAddressStatus;

use crate::change::{AddressChange, AddressChangeType, ChangeContext};

/// East and north components of a projected coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub east: f64,
    pub north: f64,
}

impl Coordinate {
    pub fn new(east: f64, north: f64) -> Self {
        Self { east, north }
    }

    /// Euclidean distance between two coordinates.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        (other.east - self.east).hypot(other.north - self.north)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.east, self.north)
    }
}

pub fn municipal_code_changed(ctx: &ChangeContext, before: &str, after: &str) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressMunicipalCodeChanged,
        Some(before.to_string()),
        Some(after.to_string()),
    )
}

pub fn status_changed(
    ctx: &ChangeContext,
    before: AccessAddressStatus,
    after: AccessAddressStatus,
) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressStatusChanged,
        Some(before.as_str().to_string()),
        Some(after.as_str().to_string()),
    )
}

pub fn road_code_changed(ctx: &ChangeContext, before: &str, after: &str) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressRoadCodeChanged,
        Some(before.to_string()),
        Some(after.to_string()),
    )
}

pub fn house_number_changed(ctx: &ChangeContext, before: &str, after: &str) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressHouseNumberChanged,
        Some(before.to_string()),
        Some(after.to_string()),
    )
}

pub fn supplementary_town_name_changed(
    ctx: &ChangeContext,
    before: Option<&str>,
    after: Option<&str>,
) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressSupplementaryTownNameChanged,
        before.map(str::to_string),
        after.map(str::to_string),
    )
}

pub fn plot_id_changed(
    ctx: &ChangeContext,
    before: Option<&str>,
    after: Option<&str>,
) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressPlotIdChanged,
        before.map(str::to_string),
        after.map(str::to_string),
    )
}

pub fn post_code_id_changed(
    ctx: &ChangeContext,
    before: PostCodeId,
    after: PostCodeId,
) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressPostCodeIdChanged,
        Some(before.to_string()),
        Some(after.to_string()),
    )
}

/// Encodes both coordinates as `"east,north"` and records the distance moved.
pub fn coordinate_changed(
    ctx: &ChangeContext,
    before: Coordinate,
    after: Coordinate,
) -> AddressChange {
    AddressChange {
        moved_distance_meters: Some(before.distance_to(&after)),
        ..ctx.change(
            AddressChangeType::AccessAddressCoordinateChanged,
            Some(before.to_string()),
            Some(after.to_string()),
        )
    }
}

pub fn road_id_changed(ctx: &ChangeContext, before: RoadId, after: RoadId) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressRoadIdChanged,
        Some(before.to_string()),
        Some(after.to_string()),
    )
}

/// Derived fact for a road id change that also changes the road name.
///
/// The values are road names rather than ids; a road missing from the view
/// has no name.
pub fn road_name_changed(
    ctx: &ChangeContext,
    before: Option<&str>,
    after: Option<&str>,
) -> AddressChange {
    ctx.change(
        AddressChangeType::AccessAddressRoadNameChanged,
        before.map(str::to_string),
        after.map(str::to_string),
    )
}

pub fn deleted(ctx: &ChangeContext) -> AddressChange {
    ctx.change(AddressChangeType::AccessAddressDeleted, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::UnitAddressId;
    use event_store::{EventId, SequenceNumber};

    fn context() -> ChangeContext {
        ChangeContext {
            unit_address_id: UnitAddressId::new(),
            event_id: EventId::new(),
            sequence_number: SequenceNumber::new(11),
            event_timestamp: Utc::now(),
            external_updated: None,
        }
    }

    #[test]
    fn test_coordinate_changed_encodes_pairs_and_distance() {
        let change = coordinate_changed(
            &context(),
            Coordinate::new(53.205, 10.203),
            Coordinate::new(63.206, 20.204),
        );

        assert_eq!(change.change_type, AddressChangeType::AccessAddressCoordinateChanged);
        assert_eq!(change.before.as_deref(), Some("53.205,10.203"));
        assert_eq!(change.after.as_deref(), Some("63.206,20.204"));

        let expected = ((63.206_f64 - 53.205).powi(2) + (20.204_f64 - 10.203).powi(2)).sqrt();
        let distance = change.moved_distance_meters.unwrap();
        assert!((distance - expected).abs() < 1e-9);
        assert!((distance - 14.1435).abs() < 1e-3);
    }

    #[test]
    fn test_coordinate_display_recovers_components() {
        let coordinate = Coordinate::new(553_205.25, 6_170_203.5);
        let text = coordinate.to_string();
        let (east, north) = text.split_once(',').unwrap();

        assert_eq!(east.parse::<f64>().unwrap(), 553_205.25);
        assert_eq!(north.parse::<f64>().unwrap(), 6_170_203.5);
    }

    #[test]
    fn test_status_changed_uses_names() {
        let change = status_changed(
            &context(),
            AccessAddressStatus::Pending,
            AccessAddressStatus::Active,
        );
        assert_eq!(change.change_type, AddressChangeType::AccessAddressStatusChanged);
        assert_eq!(change.before.as_deref(), Some("Pending"));
        assert_eq!(change.after.as_deref(), Some("Active"));
        assert_eq!(change.moved_distance_meters, None);
    }

    #[test]
    fn test_text_fields_pass_through() {
        let ctx = context();

        let change = municipal_code_changed(&ctx, "0630", "0607");
        assert_eq!(change.change_type, AddressChangeType::AccessAddressMunicipalCodeChanged);
        assert_eq!(change.before.as_deref(), Some("0630"));
        assert_eq!(change.after.as_deref(), Some("0607"));

        let change = road_code_changed(&ctx, "1234", "4321");
        assert_eq!(change.change_type, AddressChangeType::AccessAddressRoadCodeChanged);
        assert_eq!(change.after.as_deref(), Some("4321"));

        let change = house_number_changed(&ctx, "10", "10A");
        assert_eq!(change.change_type, AddressChangeType::AccessAddressHouseNumberChanged);
        assert_eq!(change.before.as_deref(), Some("10"));
        assert_eq!(change.after.as_deref(), Some("10A"));

        let change = supplementary_town_name_changed(&ctx, None, Some("Bredballe"));
        assert_eq!(
            change.change_type,
            AddressChangeType::AccessAddressSupplementaryTownNameChanged
        );
        assert_eq!(change.before, None);
        assert_eq!(change.after.as_deref(), Some("Bredballe"));

        let change = plot_id_changed(&ctx, Some("12a"), None);
        assert_eq!(change.change_type, AddressChangeType::AccessAddressPlotIdChanged);
        assert_eq!(change.before.as_deref(), Some("12a"));
        assert_eq!(change.after, None);
    }

    #[test]
    fn test_identifiers_encode_as_uuid_text() {
        let ctx = context();
        let (old_road, new_road) = (RoadId::new(), RoadId::new());

        let change = road_id_changed(&ctx, old_road, new_road);
        assert_eq!(change.change_type, AddressChangeType::AccessAddressRoadIdChanged);
        assert_eq!(change.before.unwrap().parse::<RoadId>().unwrap(), old_road);
        assert_eq!(change.after.unwrap().parse::<RoadId>().unwrap(), new_road);

        let (old_post_code, new_post_code) = (PostCodeId::new(), PostCodeId::new());
        let change = post_code_id_changed(&ctx, old_post_code, new_post_code);
        assert_eq!(change.change_type, AddressChangeType::AccessAddressPostCodeIdChanged);
        assert_eq!(change.before, Some(old_post_code.to_string()));
        assert_eq!(change.after, Some(new_post_code.to_string()));
    }

    #[test]
    fn test_road_name_changed_carries_names() {
        let change = road_name_changed(&context(), Some("Vejlevej"), Some("Fredericiavej"));
        assert_eq!(change.change_type, AddressChangeType::AccessAddressRoadNameChanged);
        assert_eq!(change.before.as_deref(), Some("Vejlevej"));
        assert_eq!(change.after.as_deref(), Some("Fredericiavej"));
    }

    #[test]
    fn test_deleted_has_no_values() {
        let change = deleted(&context());
        assert_eq!(change.change_type, AddressChangeType::AccessAddressDeleted);
        assert_eq!(change.before, None);
        assert_eq!(change.after, None);
    }
}
