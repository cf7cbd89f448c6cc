//! Identifier newtypes for graph entities.
//!
//! Every entity kind gets its own string-backed id type so a `PersonId` can
//! never be passed where a `MediaId` is expected. Generated ids are UUID v7,
//! which sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from an existing string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a new unique, time-ordered id.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, uuid::Uuid::now_v7().simple()))
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_id!(
    /// Identifier of a family tree.
    TreeId,
    "tree"
);
define_id!(
    /// Identifier of a person.
    PersonId,
    "per"
);
define_id!(
    /// Identifier of a relationship edge.
    RelationshipId,
    "rel"
);
define_id!(
    /// Identifier of a life event.
    EventId,
    "evt"
);
define_id!(
    /// Identifier of a media record.
    MediaId,
    "med"
);
