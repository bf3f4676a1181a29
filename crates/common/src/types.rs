use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype.
///
/// Each identifier is a distinct type so that an access address id can never
/// be passed where a unit address id is expected, while all of them share the
/// same textual form (hyphenated lowercase UUID) and serde representation.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifier of an event stream (one access address, unit address or road).
    AggregateId
);

uuid_id!(
    /// Identifier of an access address: a physical address with street,
    /// house number and coordinates.
    AccessAddressId
);

uuid_id!(
    /// Identifier of a unit address (floor/suite) within an access address.
    UnitAddressId
);

uuid_id!(
    /// Identifier of a road.
    RoadId
);

uuid_id!(
    /// Identifier of a post code.
    PostCodeId
);

impl From<AccessAddressId> for AggregateId {
    fn from(id: AccessAddressId) -> Self {
        Self(id.0)
    }
}

impl From<UnitAddressId> for AggregateId {
    fn from(id: UnitAddressId) -> Self {
        Self(id.0)
    }
}

impl From<RoadId> for AggregateId {
    fn from(id: RoadId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_new_creates_unique_ids() {
        let id1 = UnitAddressId::new();
        let id2 = UnitAddressId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = AccessAddressId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_id_display_is_hyphenated_uuid() {
        let id: RoadId = "01aed8c7-28b5-4e77-ac6b-80dd84df921f".parse().unwrap();
        assert_eq!(id.to_string(), "01aed8c7-28b5-4e77-ac6b-80dd84df921f");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = PostCodeId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));

        let deserialized: PostCodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_address_ids_convert_to_aggregate_ids() {
        let id = UnitAddressId::new();
        let aggregate: AggregateId = id.into();
        assert_eq!(aggregate.as_uuid(), id.as_uuid());
    }
}
