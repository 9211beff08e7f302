//! Type-safe identifiers for backend records.
//!
//! The tournament backend is not consistent about identifier encoding:
//! some records carry numeric ids, others string ids. Every newtype here
//! stores the canonical string form and deserializes from either a JSON
//! string or a JSON number, so identifiers cannot be confused with one
//! another or with free-form strings.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Deserializes a JSON string or integer into its canonical string form.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or integer identifier")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

macro_rules! backend_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from its string form.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                string_or_number(deserializer).map(Self)
            }
        }
    };
}

backend_id!(
    /// Identifier of a single fixture (`MatchRecord`).
    MatchId
);

backend_id!(
    /// Identifier of a tournament.
    TournamentId
);

backend_id!(
    /// Identifier of a participant (team or solo player).
    ParticipantId
);

backend_id!(
    /// Identifier of a recorded match event.
    ///
    /// Events appended optimistically carry a temporary `tmp-` id until
    /// the next reload replaces them with the backend's id.
    EventId
);

impl EventId {
    /// Generates a temporary client-side id for an optimistic event.
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("tmp-{}", uuid::Uuid::new_v4()))
    }

    /// Returns `true` if this id was generated client-side.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with("tmp-")
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_numeric_id() {
        let Ok(id) = serde_json::from_str::<MatchId>("42") else {
            panic!("numeric id rejected");
        };
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn deserializes_string_id() {
        let Ok(id) = serde_json::from_str::<TournamentId>("\"t-7\"") else {
            panic!("string id rejected");
        };
        assert_eq!(id, TournamentId::from("t-7"));
    }

    #[test]
    fn rejects_non_scalar_id() {
        assert!(serde_json::from_str::<ParticipantId>("{}").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&MatchId::new("9")).unwrap_or_default();
        assert_eq!(json, "\"9\"");
    }

    #[test]
    fn temporary_event_ids_are_unique_and_flagged() {
        let a = EventId::temporary();
        let b = EventId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(!EventId::from("17").is_temporary());
    }
}
