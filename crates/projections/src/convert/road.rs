//! Converter for road renames.

use crate::change::{AddressChange, AddressChangeType, ChangeContext};

/// Builds the fact for one unit address on a renamed road.
pub fn name_changed(ctx: &ChangeContext, before: Option<&str>, after: &str) -> AddressChange {
    ctx.change(
        AddressChangeType::RoadNameChanged,
        before.map(str::to_string),
        Some(after.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::UnitAddressId;
    use event_store::{EventId, SequenceNumber};

    #[test]
    fn test_name_changed_encodes_both_names() {
        let ctx = ChangeContext {
            unit_address_id: UnitAddressId::new(),
            event_id: EventId::new(),
            sequence_number: SequenceNumber::new(3),
            event_timestamp: Utc::now(),
            external_updated: None,
        };

        let change = name_changed(&ctx, Some("Vejlevej 10"), "Fredericiavej 20");

        assert_eq!(change.change_type, AddressChangeType::RoadNameChanged);
        assert_eq!(change.unit_address_id, ctx.unit_address_id);
        assert_eq!(change.before.as_deref(), Some("Vejlevej 10"));
        assert_eq!(change.after.as_deref(), Some("Fredericiavej 20"));
    }
}
