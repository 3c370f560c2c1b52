//! Typed ID definitions for evently resources.
//!
//! Each ID type has a unique prefix that identifies the resource type.
//! IDs are ULID-based for sortability and uniqueness. The inherent impls
//! are written out per type; only the mechanical trait impls (Display,
//! FromStr, serde) are shared through a local macro, and the parsing rules
//! live in [`parse_prefixed`].

use ulid::Ulid;

use crate::error::IdError;

/// Parses a `{prefix}_{ulid}` string, checking the prefix strictly.
fn parse_prefixed(expected: &'static str, s: &str) -> Result<Ulid, IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }

    let Some((prefix, ulid_str)) = s.split_once('_') else {
        return Err(IdError::MissingSeparator);
    };

    if prefix != expected {
        return Err(IdError::InvalidPrefix {
            expected,
            actual: prefix.to_string(),
        });
    }

    ulid_str
        .parse::<Ulid>()
        .map_err(|e| IdError::InvalidUlid(e.to_string()))
}

macro_rules! id_serde_and_str {
    ($name:ident) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<Ulid> for $name {
            fn as_ref(&self) -> &Ulid {
                &self.0
            }
        }
    };
}

// =============================================================================
// EventId
// =============================================================================

/// Identifier of a stored event, `evt_{ulid}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(Ulid);

impl EventId {
    /// The prefix for this ID type.
    pub const PREFIX: &'static str = "evt";

    /// Creates a new ID with a fresh ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates an ID from a raw ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn ulid(&self) -> Ulid {
        self.0
    }

    /// Parses an ID from a string in the format `evt_{ulid}`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_prefixed(Self::PREFIX, s).map(Self)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

id_serde_and_str!(EventId);

// =============================================================================
// AccountId
// =============================================================================

/// Identifier of an account, `acct_{ulid}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(Ulid);

impl AccountId {
    /// The prefix for this ID type.
    pub const PREFIX: &'static str = "acct";

    /// Creates a new ID with a fresh ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates an ID from a raw ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn ulid(&self) -> Ulid {
        self.0
    }

    /// Parses an ID from a string in the format `acct_{ulid}`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_prefixed(Self::PREFIX, s).map(Self)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

id_serde_and_str!(AccountId);

// =============================================================================
// RequestId
// =============================================================================

/// Correlation ID attached to every API request, `req_{ulid}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(Ulid);

impl RequestId {
    /// The prefix for this ID type.
    pub const PREFIX: &'static str = "req";

    /// Creates a new ID with a fresh ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parses an ID from a string in the format `req_{ulid}`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        parse_prefixed(Self::PREFIX, s).map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

id_serde_and_str!(RequestId);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_roundtrip() {
        let id = EventId::new();
        let s = id.to_string();
        let parsed: EventId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_id_prefix() {
        let id = EventId::new();
        assert!(id.to_string().starts_with("evt_"));
    }

    #[test]
    fn test_event_id_rejects_account_prefix() {
        let acct = AccountId::new().to_string();
        let result = EventId::parse(&acct);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_prefix_error());
    }

    #[test]
    fn test_event_id_missing_separator() {
        let result = EventId::parse("evt01HV4Z2WQXKJNM8GPQY6VBKC3D");
        assert!(matches!(result.unwrap_err(), IdError::MissingSeparator));
    }

    #[test]
    fn test_event_id_empty() {
        let result = EventId::parse("");
        assert!(matches!(result.unwrap_err(), IdError::Empty));
    }

    #[test]
    fn test_event_id_invalid_ulid() {
        let result = EventId::parse("evt_not-a-ulid");
        assert!(matches!(result.unwrap_err(), IdError::InvalidUlid(_)));
    }

    #[test]
    fn test_account_id_json_roundtrip() {
        let id = AccountId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_id_sortable() {
        let id1 = EventId::new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = EventId::new();
        // ULIDs are time-ordered, so id1 < id2
        assert!(id1 < id2);
    }

    #[test]
    fn test_all_id_prefixes_unique() {
        let prefixes = [EventId::PREFIX, AccountId::PREFIX, RequestId::PREFIX];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(prefixes.len(), unique.len(), "Duplicate ID prefixes found!");
    }
}
