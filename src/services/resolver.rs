//! Relationship queries over a [`GraphStore`].
//!
//! Every query follows the store's indices, so parents, children and spouses
//! cost O(edges of the person). Results are in relationship-creation order.
//!
//! # Example
//!
//! ```rust
//! use famgraph::models::{PersonData, RelationshipType, TreeId};
//! use famgraph::{GraphStore, RelationshipResolver};
//!
//! let mut store = GraphStore::new(TreeId::new("tree_1"));
//! let mum = store.add_person(PersonData::named("Mia", "Cole")).unwrap();
//! let kid_a = store.add_person(PersonData::named("Ada", "Cole")).unwrap();
//! let kid_b = store.add_person(PersonData::named("Bo", "Cole")).unwrap();
//! store.add_relationship(&mum, &kid_a, RelationshipType::ParentChild).unwrap();
//! store.add_relationship(&mum, &kid_b, RelationshipType::ParentChild).unwrap();
//!
//! let resolver = RelationshipResolver::new(&store);
//! let siblings = resolver.siblings(&kid_a);
//! assert_eq!(siblings.len(), 1);
//! assert_eq!(siblings[0].id, kid_b);
//! ```

use crate::models::{Person, PersonId};
use crate::storage::graph::GraphStore;
use std::collections::{HashSet, VecDeque};

/// Derives family relations from the edges recorded in a store.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipResolver<'a> {
    store: &'a GraphStore,
}

impl<'a> RelationshipResolver<'a> {
    /// Creates a resolver over a store.
    #[must_use]
    pub const fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Returns the parents of a person.
    #[must_use]
    pub fn parents(&self, id: &PersonId) -> Vec<&'a Person> {
        self.store
            .edges_as_child(id)
            .filter_map(|rel| self.store.person(&rel.person_a))
            .collect()
    }

    /// Returns the children of a person.
    #[must_use]
    pub fn children(&self, id: &PersonId) -> Vec<&'a Person> {
        self.store
            .edges_as_parent(id)
            .filter_map(|rel| self.store.person(&rel.person_b))
            .collect()
    }

    /// Returns the person's first spouse, if any.
    ///
    /// When several spouse relationships exist only the earliest recorded one
    /// is surfaced; use [`RelationshipResolver::spouses`] for all of them.
    #[must_use]
    pub fn spouse(&self, id: &PersonId) -> Option<&'a Person> {
        self.spouses(id).into_iter().next()
    }

    /// Returns every spouse of a person.
    #[must_use]
    pub fn spouses(&self, id: &PersonId) -> Vec<&'a Person> {
        self.store
            .spouse_edges(id)
            .filter_map(|rel| rel.other(id))
            .filter(|other| *other != id)
            .filter_map(|other| self.store.person(other))
            .collect()
    }

    /// Returns the union of every parent's children, excluding the person.
    ///
    /// Half-siblings are included. Each sibling appears once, at the position
    /// where it was first seen.
    #[must_use]
    pub fn siblings(&self, id: &PersonId) -> Vec<&'a Person> {
        let mut seen: HashSet<&PersonId> = HashSet::new();
        let mut siblings = Vec::new();
        for parent in self.parents(id) {
            for child in self.children(&parent.id) {
                if child.id != *id && seen.insert(&child.id) {
                    siblings.push(child);
                }
            }
        }
        siblings
    }

    /// Returns all ancestors of a person, nearest generation first.
    #[must_use]
    pub fn ancestors(&self, id: &PersonId) -> Vec<&'a Person> {
        let mut visited: HashSet<&PersonId> = HashSet::from([id]);
        let mut queue: VecDeque<&PersonId> = VecDeque::from([id]);
        let mut ancestors = Vec::new();

        while let Some(current) = queue.pop_front() {
            for parent in self.parents(current) {
                if visited.insert(&parent.id) {
                    ancestors.push(parent);
                    queue.push_back(&parent.id);
                }
            }
        }
        ancestors
    }

    /// Returns true if `candidate` is an ancestor of `person`.
    #[must_use]
    pub fn is_ancestor(&self, candidate: &PersonId, person: &PersonId) -> bool {
        self.store.is_ancestor(candidate, person)
    }
}
