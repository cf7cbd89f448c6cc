//! Trees, persisted tree contents, and point-in-time snapshots.

use super::{Event, Media, Person, PersonId, Relationship, TreeId};
use serde::{Deserialize, Serialize};

/// A family tree: the scope all other entities belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    /// Unique identifier.
    pub id: TreeId,
    /// Display name.
    pub name: String,
    /// Id of the owning user.
    pub owner_id: String,
    /// Creation time (Unix seconds).
    #[serde(default)]
    pub created_at: u64,
}

impl Tree {
    /// Creates a tree with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: TreeId::generate(),
            name: name.into(),
            owner_id: owner_id.into(),
            created_at: crate::current_timestamp(),
        }
    }

    /// Creates the tree with a specific id.
    #[must_use]
    pub fn with_id(mut self, id: TreeId) -> Self {
        self.id = id;
        self
    }
}

/// Full contents of a tree as exchanged with persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeData {
    /// Tree metadata.
    pub tree: Tree,
    /// People, in creation order.
    #[serde(default)]
    pub people: Vec<Person>,
    /// Relationships, in creation order.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Events, in creation order.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Media, in creation order.
    #[serde(default)]
    pub media: Vec<Media>,
}

impl TreeData {
    /// Creates empty contents for a tree.
    #[must_use]
    pub const fn empty(tree: Tree) -> Self {
        Self {
            tree,
            people: Vec::new(),
            relationships: Vec::new(),
            events: Vec::new(),
            media: Vec::new(),
        }
    }
}

/// Immutable point-in-time view of one tree.
///
/// Collections are in insertion order. The layout engine and exporters only
/// ever see snapshots, never the live store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    /// Tree metadata, if a tree is loaded.
    pub tree: Option<Tree>,
    /// People, in insertion order.
    pub people: Vec<Person>,
    /// Relationships, in insertion order.
    pub relationships: Vec<Relationship>,
    /// Events, in insertion order.
    pub events: Vec<Event>,
    /// Media, in insertion order.
    pub media: Vec<Media>,
}

impl GraphSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the snapshot holds no people.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Looks up a person by id (linear scan).
    #[must_use]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|p| p.id == *id)
    }
}

impl From<TreeData> for GraphSnapshot {
    fn from(data: TreeData) -> Self {
        Self {
            tree: Some(data.tree),
            people: data.people,
            relationships: data.relationships,
            events: data.events,
            media: data.media,
        }
    }
}
