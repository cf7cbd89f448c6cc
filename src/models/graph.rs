//! Relationship edges of the family graph.
//!
//! # Relationship Types
//!
//! | Type | Direction | Meaning |
//! |------|-----------|---------|
//! | `ParentChild` | directed | `person_a` is a parent of `person_b` |
//! | `Spouse` | undirected | `person_a` and `person_b` are partners |
//!
//! # Example
//!
//! ```rust
//! use famgraph::models::{PersonId, Relationship, RelationshipType, TreeId};
//!
//! let edge = Relationship::new(
//!     TreeId::new("tree_1"),
//!     PersonId::new("per_mother"),
//!     PersonId::new("per_daughter"),
//!     RelationshipType::ParentChild,
//! );
//! assert!(edge.involves(&PersonId::new("per_daughter")));
//! ```

use super::{PersonId, RelationshipId, TreeId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of relationship between two people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    /// `person_a` is a parent of `person_b`.
    ParentChild,
    /// `person_a` and `person_b` are spouses or partners.
    Spouse,
}

impl RelationshipType {
    /// Returns all relationship type variants.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::ParentChild, Self::Spouse]
    }

    /// Returns the relationship type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParentChild => "parent-child",
            Self::Spouse => "spouse",
        }
    }

    /// Returns true if the relationship reads the same in both directions.
    #[must_use]
    pub const fn is_symmetric(&self) -> bool {
        matches!(self, Self::Spouse)
    }

    /// Parses a relationship type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "parent-child" | "parentchild" | "parent" | "child" => Some(Self::ParentChild),
            "spouse" | "partner" | "married" | "marriage" => Some(Self::Spouse),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Validation(format!("unknown relationship type: {s}")))
    }
}

/// A typed edge between two people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Unique identifier.
    pub id: RelationshipId,
    /// Owning tree.
    pub tree_id: TreeId,
    /// First endpoint (the parent for parent-child edges).
    pub person_a: PersonId,
    /// Second endpoint (the child for parent-child edges).
    pub person_b: PersonId,
    /// Type of relationship.
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: u64,
}

impl Relationship {
    /// Creates a new relationship with a fresh id.
    #[must_use]
    pub fn new(
        tree_id: TreeId,
        person_a: PersonId,
        person_b: PersonId,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id: RelationshipId::generate(),
            tree_id,
            person_a,
            person_b,
            relationship_type,
            created_at: crate::current_timestamp(),
        }
    }

    /// Creates the relationship with a specific id.
    #[must_use]
    pub fn with_id(mut self, id: RelationshipId) -> Self {
        self.id = id;
        self
    }

    /// Returns true if the person is either endpoint.
    #[must_use]
    pub fn involves(&self, person: &PersonId) -> bool {
        self.person_a == *person || self.person_b == *person
    }

    /// Returns the endpoint opposite to `person`, if `person` is an endpoint.
    #[must_use]
    pub fn other(&self, person: &PersonId) -> Option<&PersonId> {
        if self.person_a == *person {
            Some(&self.person_b)
        } else if self.person_b == *person {
            Some(&self.person_a)
        } else {
            None
        }
    }

    /// Returns true if both edges connect the same people with the same type.
    ///
    /// Spouse edges match regardless of endpoint order.
    #[must_use]
    pub fn same_edge(&self, a: &PersonId, b: &PersonId, relationship_type: RelationshipType) -> bool {
        if self.relationship_type != relationship_type {
            return false;
        }
        let forward = self.person_a == *a && self.person_b == *b;
        let backward = self.person_a == *b && self.person_b == *a;
        forward || (relationship_type.is_symmetric() && backward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str, t: RelationshipType) -> Relationship {
        Relationship::new(TreeId::new("t"), PersonId::new(a), PersonId::new(b), t)
    }

    #[test]
    fn test_relationship_type_parse() {
        assert_eq!(
            RelationshipType::parse("parent-child"),
            Some(RelationshipType::ParentChild)
        );
        assert_eq!(
            RelationshipType::parse("PARENT_CHILD"),
            Some(RelationshipType::ParentChild)
        );
        assert_eq!(RelationshipType::parse("partner"), Some(RelationshipType::Spouse));
        assert_eq!(RelationshipType::parse("cousin"), None);
    }

    #[test]
    fn test_relationship_type_serde() {
        let json = serde_json::to_string(&RelationshipType::ParentChild).unwrap();
        assert_eq!(json, "\"parent-child\"");
    }

    #[test]
    fn test_other_endpoint() {
        let rel = edge("a", "b", RelationshipType::Spouse);
        assert_eq!(rel.other(&PersonId::new("a")), Some(&PersonId::new("b")));
        assert_eq!(rel.other(&PersonId::new("b")), Some(&PersonId::new("a")));
        assert_eq!(rel.other(&PersonId::new("c")), None);
    }

    #[test]
    fn test_same_edge_respects_direction() {
        let a = PersonId::new("a");
        let b = PersonId::new("b");

        let spouse = edge("a", "b", RelationshipType::Spouse);
        assert!(spouse.same_edge(&b, &a, RelationshipType::Spouse));

        let parent = edge("a", "b", RelationshipType::ParentChild);
        assert!(parent.same_edge(&a, &b, RelationshipType::ParentChild));
        assert!(!parent.same_edge(&b, &a, RelationshipType::ParentChild));
        assert!(!parent.same_edge(&a, &b, RelationshipType::Spouse));
    }
}
