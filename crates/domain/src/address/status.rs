//! Lifecycle status of access and unit addresses.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Status of an access address in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessAddressStatus {
    /// The address is in use.
    Active,

    /// The address was registered by mistake and withdrawn.
    Canceled,

    /// The address is planned but not yet in use.
    Pending,

    /// The address is no longer in use.
    Discontinued,
}

impl AccessAddressStatus {
    /// Returns the canonical status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAddressStatus::Active => "Active",
            AccessAddressStatus::Canceled => "Canceled",
            AccessAddressStatus::Pending => "Pending",
            AccessAddressStatus::Discontinued => "Discontinued",
        }
    }
}

impl std::fmt::Display for AccessAddressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccessAddressStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(AccessAddressStatus::Active),
            "Canceled" => Ok(AccessAddressStatus::Canceled),
            "Pending" => Ok(AccessAddressStatus::Pending),
            "Discontinued" => Ok(AccessAddressStatus::Discontinued),
            other => Err(DomainError::UnknownStatus {
                kind: "AccessAddressStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of a unit address in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitAddressStatus {
    /// The unit address is in use.
    Active,

    /// The unit address was registered by mistake and withdrawn.
    Canceled,

    /// The unit address is planned but not yet in use.
    Pending,

    /// The unit address is no longer in use.
    Discontinued,
}

impl UnitAddressStatus {
    /// Returns the canonical status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitAddressStatus::Active => "Active",
            UnitAddressStatus::Canceled => "Canceled",
            UnitAddressStatus::Pending => "Pending",
            UnitAddressStatus::Discontinued => "Discontinued",
        }
    }
}

impl std::fmt::Display for UnitAddressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UnitAddressStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(UnitAddressStatus::Active),
            "Canceled" => Ok(UnitAddressStatus::Canceled),
            "Pending" => Ok(UnitAddressStatus::Pending),
            "Discontinued" => Ok(UnitAddressStatus::Discontinued),
            other => Err(DomainError::UnknownStatus {
                kind: "UnitAddressStatus",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_variant_names() {
        assert_eq!(AccessAddressStatus::Active.to_string(), "Active");
        assert_eq!(AccessAddressStatus::Canceled.to_string(), "Canceled");
        assert_eq!(UnitAddressStatus::Pending.to_string(), "Pending");
        assert_eq!(UnitAddressStatus::Discontinued.to_string(), "Discontinued");
    }

    #[test]
    fn test_parse_recovers_status() {
        for status in [
            UnitAddressStatus::Active,
            UnitAddressStatus::Canceled,
            UnitAddressStatus::Pending,
            UnitAddressStatus::Discontinued,
        ] {
            assert_eq!(status.as_str().parse::<UnitAddressStatus>().unwrap(), status);
        }
        assert_eq!(
            "Pending".parse::<AccessAddressStatus>().unwrap(),
            AccessAddressStatus::Pending
        );
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let err = "Retired".parse::<AccessAddressStatus>().unwrap_err();
        assert!(matches!(
            err,
            DomainError::UnknownStatus { kind: "AccessAddressStatus", ref value } if value == "Retired"
        ));
    }

    #[test]
    fn test_serialization_matches_display() {
        let json = serde_json::to_string(&UnitAddressStatus::Active).unwrap();
        assert_eq!(json, "\"Active\"");

        let deserialized: AccessAddressStatus = serde_json::from_str("\"Discontinued\"").unwrap();
        assert_eq!(deserialized, AccessAddressStatus::Discontinued);
    }
}
