//! Indexed in-memory graph store.
//!
//! [`GraphStore`] is the exclusive in-memory owner of a tree's people,
//! relationships, events and media. Every mutation validates first and only
//! then touches state, so a failed call never leaves a partial change behind.
//!
//! # Indices
//!
//! | Index | Key | Value |
//! |-------|-----|-------|
//! | `people` | person id | person |
//! | `as_parent` | person id | parent-child edges where the person is the parent |
//! | `as_child` | person id | parent-child edges where the person is the child |
//! | `spouses` | person id | spouse edges touching the person |
//!
//! Index vectors hold relationship ids in creation order, which is the order
//! every relationship query reports results in.

use crate::models::{
    Event, EventData, EventId, GraphSnapshot, Media, MediaData, MediaId, Person, PersonData,
    PersonId, Relationship, RelationshipId, RelationshipType, Tree, TreeData, TreeId,
};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Ids removed by a cascading person removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// The removed person.
    pub person: Option<PersonId>,
    /// Relationships that referenced the person.
    pub relationships: Vec<RelationshipId>,
    /// Events that referenced the person.
    pub events: Vec<EventId>,
    /// Media that referenced the person.
    pub media: Vec<MediaId>,
}

impl RemovalReport {
    /// Total number of records removed, including the person.
    #[must_use]
    pub fn total(&self) -> usize {
        usize::from(self.person.is_some())
            + self.relationships.len()
            + self.events.len()
            + self.media.len()
    }
}

/// Counts describing a store's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    /// Number of people.
    pub person_count: usize,
    /// Number of relationships of any type.
    pub relationship_count: usize,
    /// Number of parent-child edges.
    pub parent_child_count: usize,
    /// Number of spouse edges.
    pub spouse_count: usize,
    /// Number of events.
    pub event_count: usize,
    /// Number of media records.
    pub media_count: usize,
    /// Number of people still living.
    pub living_count: usize,
}

/// In-memory, indexed family graph for a single tree.
///
/// # Example
///
/// ```rust
/// use famgraph::models::{PersonData, RelationshipType, TreeId};
/// use famgraph::GraphStore;
///
/// let mut store = GraphStore::new(TreeId::new("tree_1"));
/// let a = store.add_person(PersonData::named("Ann", "Lee")).unwrap();
/// let b = store.add_person(PersonData::named("Ben", "Lee")).unwrap();
/// store.add_relationship(&a, &b, RelationshipType::ParentChild).unwrap();
///
/// // The reverse edge would make Ann her own ancestor.
/// assert!(store.add_relationship(&b, &a, RelationshipType::ParentChild).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct GraphStore {
    tree_id: TreeId,
    tree: Option<Tree>,
    people: HashMap<PersonId, Person>,
    person_order: Vec<PersonId>,
    relationships: HashMap<RelationshipId, Relationship>,
    relationship_order: Vec<RelationshipId>,
    events: HashMap<EventId, Event>,
    event_order: Vec<EventId>,
    media: HashMap<MediaId, Media>,
    media_order: Vec<MediaId>,
    as_parent: HashMap<PersonId, Vec<RelationshipId>>,
    as_child: HashMap<PersonId, Vec<RelationshipId>>,
    spouses: HashMap<PersonId, Vec<RelationshipId>>,
}

impl GraphStore {
    /// Creates an empty store scoped to a tree.
    #[must_use]
    pub fn new(tree_id: TreeId) -> Self {
        Self {
            tree_id,
            tree: None,
            people: HashMap::new(),
            person_order: Vec::new(),
            relationships: HashMap::new(),
            relationship_order: Vec::new(),
            events: HashMap::new(),
            event_order: Vec::new(),
            media: HashMap::new(),
            media_order: Vec::new(),
            as_parent: HashMap::new(),
            as_child: HashMap::new(),
            spouses: HashMap::new(),
        }
    }

    /// Builds a store from persisted tree contents.
    ///
    /// Self-referential or cyclic edges are accepted with a warning so that a
    /// damaged tree can still be opened and repaired.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for duplicate ids, records scoped to a
    /// different tree, or references to people or media that do not exist.
    pub fn from_tree_data(data: TreeData) -> Result<Self> {
        let mut store = Self::new(data.tree.id.clone());
        store.tree = Some(data.tree);

        for person in data.people {
            store.check_scope("person", person.id.as_str(), &person.tree_id)?;
            if store.people.contains_key(&person.id) {
                return Err(Error::Validation(format!("duplicate person id: {}", person.id)));
            }
            store.insert_person(person);
        }

        for rel in data.relationships {
            store.check_scope("relationship", rel.id.as_str(), &rel.tree_id)?;
            if store.relationships.contains_key(&rel.id) {
                return Err(Error::Validation(format!("duplicate relationship id: {}", rel.id)));
            }
            for endpoint in [&rel.person_a, &rel.person_b] {
                if !store.people.contains_key(endpoint) {
                    return Err(Error::Validation(format!(
                        "relationship {} references missing person {endpoint}",
                        rel.id
                    )));
                }
            }
            if rel.person_a == rel.person_b {
                warn!(relationship_id = %rel.id, "Loaded self-referential relationship");
            } else if rel.relationship_type == RelationshipType::ParentChild
                && store.is_ancestor(&rel.person_b, &rel.person_a)
            {
                warn!(relationship_id = %rel.id, "Loaded relationship that closes an ancestor cycle");
            }
            store.insert_relationship(rel);
        }

        for media in data.media {
            store.check_scope("media", media.id.as_str(), &media.tree_id)?;
            if let Some(person_id) = &media.data.person_id {
                if !store.people.contains_key(person_id) {
                    return Err(Error::Validation(format!(
                        "media {} references missing person {person_id}",
                        media.id
                    )));
                }
            }
            store.media_order.push(media.id.clone());
            store.media.insert(media.id.clone(), media);
        }

        for event in data.events {
            store.check_scope("event", event.id.as_str(), &event.tree_id)?;
            if let Some(person_id) = &event.data.person_id {
                if !store.people.contains_key(person_id) {
                    return Err(Error::Validation(format!(
                        "event {} references missing person {person_id}",
                        event.id
                    )));
                }
            }
            if let Some(media_id) = &event.data.media_id {
                if !store.media.contains_key(media_id) {
                    return Err(Error::Validation(format!(
                        "event {} references missing media {media_id}",
                        event.id
                    )));
                }
            }
            store.event_order.push(event.id.clone());
            store.events.insert(event.id.clone(), event);
        }

        Ok(store)
    }

    /// Atomically replaces the store's contents with persisted tree contents.
    ///
    /// On error the current contents are left untouched.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`GraphStore::from_tree_data`].
    pub fn replace(&mut self, data: TreeData) -> Result<GraphSnapshot> {
        let fresh = Self::from_tree_data(data)?;
        *self = fresh;
        Ok(self.snapshot())
    }

    fn check_scope(&self, entity: &str, id: &str, tree_id: &TreeId) -> Result<()> {
        if *tree_id == self.tree_id {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "{entity} {id} belongs to tree {tree_id}, expected {}",
                self.tree_id
            )))
        }
    }

    /// Returns the id of the tree this store is scoped to.
    #[must_use]
    pub const fn tree_id(&self) -> &TreeId {
        &self.tree_id
    }

    /// Returns the tree metadata, if loaded.
    #[must_use]
    pub const fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    // ========================================================================
    // People
    // ========================================================================

    /// Adds a person and returns the new id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the data is invalid.
    pub fn add_person(&mut self, data: PersonData) -> Result<PersonId> {
        let data = data.validated()?;
        let person = Person::new(self.tree_id.clone(), data);
        let id = person.id.clone();
        debug!(person_id = %id, "Adding person");
        self.insert_person(person);
        record_mutation("add_person");
        Ok(id)
    }

    fn insert_person(&mut self, person: Person) {
        self.person_order.push(person.id.clone());
        self.people.insert(person.id.clone(), person);
    }

    /// Replaces a person's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the person does not exist, or
    /// [`Error::Validation`] if the data is invalid.
    pub fn update_person(&mut self, id: &PersonId, data: PersonData) -> Result<()> {
        if !self.people.contains_key(id) {
            return Err(Error::not_found("person", id));
        }
        let data = data.validated()?;
        if let Some(person) = self.people.get_mut(id) {
            person.data = data;
            person.updated_at = crate::current_timestamp();
        }
        debug!(person_id = %id, "Updated person");
        record_mutation("update_person");
        Ok(())
    }

    /// Removes a person and every relationship, event and media record
    /// referencing them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the person does not exist.
    pub fn remove_person(&mut self, id: &PersonId) -> Result<RemovalReport> {
        if self.people.remove(id).is_none() {
            return Err(Error::not_found("person", id));
        }
        self.person_order.retain(|p| p != id);

        let mut report = RemovalReport {
            person: Some(id.clone()),
            ..RemovalReport::default()
        };

        let touching: Vec<RelationshipId> = self
            .relationship_order
            .iter()
            .filter(|rid| self.relationships.get(*rid).is_some_and(|r| r.involves(id)))
            .cloned()
            .collect();
        for rid in touching {
            if self.detach_relationship(&rid).is_some() {
                report.relationships.push(rid);
            }
        }

        let owned_media: Vec<MediaId> = self
            .media_order
            .iter()
            .filter(|mid| {
                self.media
                    .get(*mid)
                    .is_some_and(|m| m.data.person_id.as_ref() == Some(id))
            })
            .cloned()
            .collect();
        for mid in owned_media {
            self.detach_media(&mid);
            report.media.push(mid);
        }

        let owned_events: Vec<EventId> = self
            .event_order
            .iter()
            .filter(|eid| {
                self.events
                    .get(*eid)
                    .is_some_and(|e| e.data.person_id.as_ref() == Some(id))
            })
            .cloned()
            .collect();
        for eid in owned_events {
            self.events.remove(&eid);
            self.event_order.retain(|e| *e != eid);
            report.events.push(eid);
        }

        // Drop index keys for the removed person
        self.as_parent.remove(id);
        self.as_child.remove(id);
        self.spouses.remove(id);

        debug!(
            person_id = %id,
            relationships = report.relationships.len(),
            events = report.events.len(),
            media = report.media.len(),
            "Removed person with cascade"
        );
        record_mutation("remove_person");
        Ok(report)
    }

    /// Returns a person by id.
    #[must_use]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    /// Returns true if the person exists.
    #[must_use]
    pub fn contains_person(&self, id: &PersonId) -> bool {
        self.people.contains_key(id)
    }

    /// Iterates people in insertion order.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.person_order.iter().filter_map(|id| self.people.get(id))
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Adds a relationship and returns the new id.
    ///
    /// For parent-child edges `a` is the parent and `b` the child.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `a == b` or the same edge already exists
    /// - [`Error::NotFound`] if either person does not exist
    /// - [`Error::Cycle`] if `b` is already an ancestor of `a`
    pub fn add_relationship(
        &mut self,
        a: &PersonId,
        b: &PersonId,
        relationship_type: RelationshipType,
    ) -> Result<RelationshipId> {
        if a == b {
            return Err(Error::Validation(format!(
                "a person cannot have a {relationship_type} relationship with themselves"
            )));
        }
        for endpoint in [a, b] {
            if !self.people.contains_key(endpoint) {
                return Err(Error::not_found("person", endpoint));
            }
        }
        if self.edge_exists(a, b, relationship_type) {
            return Err(Error::Validation(format!(
                "{relationship_type} relationship between {a} and {b} already exists"
            )));
        }
        if relationship_type == RelationshipType::ParentChild && self.is_ancestor(b, a) {
            return Err(Error::Cycle {
                parent: a.to_string(),
                child: b.to_string(),
            });
        }

        let rel = Relationship::new(self.tree_id.clone(), a.clone(), b.clone(), relationship_type);
        let id = rel.id.clone();
        debug!(relationship_id = %id, %a, %b, %relationship_type, "Adding relationship");
        self.insert_relationship(rel);
        record_mutation("add_relationship");
        Ok(id)
    }

    fn edge_exists(&self, a: &PersonId, b: &PersonId, relationship_type: RelationshipType) -> bool {
        let index = match relationship_type {
            RelationshipType::ParentChild => &self.as_parent,
            RelationshipType::Spouse => &self.spouses,
        };
        index.get(a).is_some_and(|ids| {
            ids.iter()
                .filter_map(|rid| self.relationships.get(rid))
                .any(|r| r.same_edge(a, b, relationship_type))
        })
    }

    fn insert_relationship(&mut self, rel: Relationship) {
        let id = rel.id.clone();
        match rel.relationship_type {
            RelationshipType::ParentChild => {
                self.as_parent
                    .entry(rel.person_a.clone())
                    .or_default()
                    .push(id.clone());
                self.as_child
                    .entry(rel.person_b.clone())
                    .or_default()
                    .push(id.clone());
            },
            RelationshipType::Spouse => {
                self.spouses
                    .entry(rel.person_a.clone())
                    .or_default()
                    .push(id.clone());
                if rel.person_b != rel.person_a {
                    self.spouses
                        .entry(rel.person_b.clone())
                        .or_default()
                        .push(id.clone());
                }
            },
        }
        self.relationship_order.push(id.clone());
        self.relationships.insert(id, rel);
    }

    /// Removes a relationship.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the relationship does not exist.
    pub fn remove_relationship(&mut self, id: &RelationshipId) -> Result<Relationship> {
        let rel = self
            .detach_relationship(id)
            .ok_or_else(|| Error::not_found("relationship", id))?;
        debug!(relationship_id = %id, "Removed relationship");
        record_mutation("remove_relationship");
        Ok(rel)
    }

    fn detach_relationship(&mut self, id: &RelationshipId) -> Option<Relationship> {
        let rel = self.relationships.remove(id)?;
        self.relationship_order.retain(|r| r != id);
        match rel.relationship_type {
            RelationshipType::ParentChild => {
                unindex(&mut self.as_parent, &rel.person_a, id);
                unindex(&mut self.as_child, &rel.person_b, id);
            },
            RelationshipType::Spouse => {
                unindex(&mut self.spouses, &rel.person_a, id);
                unindex(&mut self.spouses, &rel.person_b, id);
            },
        }
        Some(rel)
    }

    /// Returns a relationship by id.
    #[must_use]
    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// Iterates relationships in creation order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationship_order
            .iter()
            .filter_map(|id| self.relationships.get(id))
    }

    /// Parent-child edges where `person` is the parent, in creation order.
    pub fn edges_as_parent<'a>(
        &'a self,
        person: &PersonId,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        self.indexed(&self.as_parent, person)
    }

    /// Parent-child edges where `person` is the child, in creation order.
    pub fn edges_as_child<'a>(
        &'a self,
        person: &PersonId,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        self.indexed(&self.as_child, person)
    }

    /// Spouse edges touching `person`, in creation order.
    pub fn spouse_edges<'a>(
        &'a self,
        person: &PersonId,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        self.indexed(&self.spouses, person)
    }

    fn indexed<'a>(
        &'a self,
        index: &'a HashMap<PersonId, Vec<RelationshipId>>,
        person: &PersonId,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        index
            .get(person)
            .into_iter()
            .flatten()
            .filter_map(|rid| self.relationships.get(rid))
    }

    /// Returns true if `candidate` appears among the ancestors of `person`.
    ///
    /// Walks recorded parent edges upward breadth-first. A visited set keeps
    /// the walk bounded even if loaded data already contains a cycle.
    #[must_use]
    pub fn is_ancestor(&self, candidate: &PersonId, person: &PersonId) -> bool {
        let mut visited: HashSet<&PersonId> = HashSet::new();
        let mut queue: VecDeque<&PersonId> = VecDeque::from([person]);
        visited.insert(person);

        while let Some(current) = queue.pop_front() {
            for rel in self.edges_as_child(current) {
                let parent = &rel.person_a;
                if parent == candidate {
                    return true;
                }
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    // ========================================================================
    // Events and media
    // ========================================================================

    /// Records a life event and returns the new id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank title, or [`Error::NotFound`]
    /// if the referenced person or media does not exist.
    pub fn add_event(&mut self, data: EventData) -> Result<EventId> {
        let data = data.validated()?;
        if let Some(person_id) = &data.person_id {
            if !self.people.contains_key(person_id) {
                return Err(Error::not_found("person", person_id));
            }
        }
        if let Some(media_id) = &data.media_id {
            if !self.media.contains_key(media_id) {
                return Err(Error::not_found("media", media_id));
            }
        }
        let event = Event::new(self.tree_id.clone(), data);
        let id = event.id.clone();
        self.event_order.push(id.clone());
        self.events.insert(id.clone(), event);
        debug!(event_id = %id, "Added event");
        record_mutation("add_event");
        Ok(id)
    }

    /// Removes an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event does not exist.
    pub fn remove_event(&mut self, id: &EventId) -> Result<Event> {
        let event = self
            .events
            .remove(id)
            .ok_or_else(|| Error::not_found("event", id))?;
        self.event_order.retain(|e| e != id);
        record_mutation("remove_event");
        Ok(event)
    }

    /// Returns an event by id.
    #[must_use]
    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    /// Iterates events in insertion order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.event_order.iter().filter_map(|id| self.events.get(id))
    }

    /// Registers a media record and returns the new id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank URL, or [`Error::NotFound`]
    /// if the referenced person does not exist.
    pub fn add_media(&mut self, data: MediaData) -> Result<MediaId> {
        let data = data.validated()?;
        if let Some(person_id) = &data.person_id {
            if !self.people.contains_key(person_id) {
                return Err(Error::not_found("person", person_id));
            }
        }
        let media = Media::new(self.tree_id.clone(), data);
        let id = media.id.clone();
        self.media_order.push(id.clone());
        self.media.insert(id.clone(), media);
        debug!(media_id = %id, "Added media");
        record_mutation("add_media");
        Ok(id)
    }

    /// Removes a media record and clears event references to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the media record does not exist.
    pub fn remove_media(&mut self, id: &MediaId) -> Result<Media> {
        let media = self
            .detach_media(id)
            .ok_or_else(|| Error::not_found("media", id))?;
        record_mutation("remove_media");
        Ok(media)
    }

    fn detach_media(&mut self, id: &MediaId) -> Option<Media> {
        let media = self.media.remove(id)?;
        self.media_order.retain(|m| m != id);
        for event in self.events.values_mut() {
            if event.data.media_id.as_ref() == Some(id) {
                event.data.media_id = None;
            }
        }
        Some(media)
    }

    /// Returns a media record by id.
    #[must_use]
    pub fn media(&self, id: &MediaId) -> Option<&Media> {
        self.media.get(id)
    }

    /// Iterates media records in insertion order.
    pub fn media_items(&self) -> impl Iterator<Item = &Media> {
        self.media_order.iter().filter_map(|id| self.media.get(id))
    }

    // ========================================================================
    // Reconciliation with persisted echoes
    // ========================================================================

    /// Overwrites a person with the persisted version, if still present.
    ///
    /// Returns false when the person was removed locally in the meantime.
    pub fn apply_person(&mut self, person: Person) -> bool {
        match self.people.get_mut(&person.id) {
            Some(existing) => {
                *existing = person;
                true
            },
            None => false,
        }
    }

    /// Overwrites a relationship with the persisted version.
    ///
    /// Only metadata is taken from the echo; an echo whose endpoints or type
    /// differ from the local edge is ignored.
    pub fn apply_relationship(&mut self, rel: Relationship) -> bool {
        match self.relationships.get_mut(&rel.id) {
            Some(existing)
                if existing.person_a == rel.person_a
                    && existing.person_b == rel.person_b
                    && existing.relationship_type == rel.relationship_type =>
            {
                *existing = rel;
                true
            },
            Some(_) => {
                warn!(relationship_id = %rel.id, "Ignoring persisted relationship with different endpoints");
                false
            },
            None => false,
        }
    }

    /// Overwrites an event with the persisted version, if still present.
    pub fn apply_event(&mut self, event: Event) -> bool {
        match self.events.get_mut(&event.id) {
            Some(existing) => {
                *existing = event;
                true
            },
            None => false,
        }
    }

    /// Overwrites a media record with the persisted version, if still present.
    pub fn apply_media(&mut self, media: Media) -> bool {
        match self.media.get_mut(&media.id) {
            Some(existing) => {
                *existing = media;
                true
            },
            None => false,
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Returns counts describing the store.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let parent_child_count = self
            .relationships
            .values()
            .filter(|r| r.relationship_type == RelationshipType::ParentChild)
            .count();
        GraphStats {
            person_count: self.people.len(),
            relationship_count: self.relationships.len(),
            parent_child_count,
            spouse_count: self.relationships.len() - parent_child_count,
            event_count: self.events.len(),
            media_count: self.media.len(),
            living_count: self.people.values().filter(|p| p.data.is_living).count(),
        }
    }

    /// Takes an immutable snapshot of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            tree: self.tree.clone(),
            people: self.people().cloned().collect(),
            relationships: self.relationships().cloned().collect(),
            events: self.events().cloned().collect(),
            media: self.media_items().cloned().collect(),
        }
    }

    /// Returns the contents in the shape persistence exchanges.
    ///
    /// Returns `None` when no tree metadata is loaded.
    #[must_use]
    pub fn to_tree_data(&self) -> Option<TreeData> {
        let snapshot = self.snapshot();
        snapshot.tree.map(|tree| TreeData {
            tree,
            people: snapshot.people,
            relationships: snapshot.relationships,
            events: snapshot.events,
            media: snapshot.media,
        })
    }
}

fn unindex(
    index: &mut HashMap<PersonId, Vec<RelationshipId>>,
    person: &PersonId,
    id: &RelationshipId,
) {
    if let Some(ids) = index.get_mut(person) {
        ids.retain(|r| r != id);
        if ids.is_empty() {
            index.remove(person);
        }
    }
}

fn record_mutation(op: &'static str) {
    metrics::counter!("famgraph_mutations_total", "op" => op).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, MediaType};

    fn store() -> GraphStore {
        GraphStore::new(TreeId::new("tree_1"))
    }

    fn add(store: &mut GraphStore, first: &str) -> PersonId {
        store.add_person(PersonData::named(first, "Test")).unwrap()
    }

    #[test]
    fn test_add_and_update_person() {
        let mut store = store();
        let id = add(&mut store, "Ann");
        assert_eq!(store.person(&id).unwrap().data.first_name, "Ann");

        store
            .update_person(&id, PersonData::named("Anne", "Test").with_gender(Gender::Female))
            .unwrap();
        let person = store.person(&id).unwrap();
        assert_eq!(person.data.first_name, "Anne");
        assert_eq!(person.data.gender, Gender::Female);
    }

    #[test]
    fn test_update_missing_person_is_not_found() {
        let mut store = store();
        let err = store
            .update_person(&PersonId::new("nope"), PersonData::named("X", "Y"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "person", .. }));
    }

    #[test]
    fn test_invalid_update_leaves_person_untouched() {
        let mut store = store();
        let id = add(&mut store, "Ann");
        assert!(store.update_person(&id, PersonData::named("", "X")).is_err());
        assert_eq!(store.person(&id).unwrap().data.first_name, "Ann");
    }

    #[test]
    fn test_self_relationship_rejected() {
        let mut store = store();
        let id = add(&mut store, "Ann");
        let err = store
            .add_relationship(&id, &id, RelationshipType::Spouse)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.relationships().count(), 0);
    }

    #[test]
    fn test_relationship_with_missing_person() {
        let mut store = store();
        let id = add(&mut store, "Ann");
        let err = store
            .add_relationship(&id, &PersonId::new("ghost"), RelationshipType::ParentChild)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_direct_cycle_rejected() {
        let mut store = store();
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        store
            .add_relationship(&a, &b, RelationshipType::ParentChild)
            .unwrap();
        let err = store
            .add_relationship(&b, &a, RelationshipType::ParentChild)
            .unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert_eq!(store.relationships().count(), 1);
    }

    #[test]
    fn test_transitive_cycle_rejected() {
        let mut store = store();
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        let c = add(&mut store, "C");
        store
            .add_relationship(&a, &b, RelationshipType::ParentChild)
            .unwrap();
        store
            .add_relationship(&b, &c, RelationshipType::ParentChild)
            .unwrap();
        let err = store
            .add_relationship(&c, &a, RelationshipType::ParentChild)
            .unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));

        // A second parent path that is not a cycle is fine.
        store
            .add_relationship(&a, &c, RelationshipType::ParentChild)
            .unwrap();
    }

    #[test]
    fn test_duplicate_edges_rejected() {
        let mut store = store();
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        store.add_relationship(&a, &b, RelationshipType::Spouse).unwrap();
        let err = store
            .add_relationship(&b, &a, RelationshipType::Spouse)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_remove_relationship_updates_indices() {
        let mut store = store();
        let parent = add(&mut store, "P");
        let child = add(&mut store, "C");
        let rel = store
            .add_relationship(&parent, &child, RelationshipType::ParentChild)
            .unwrap();

        let removed = store.remove_relationship(&rel).unwrap();
        assert_eq!(removed.id, rel);
        assert_eq!(store.edges_as_parent(&parent).count(), 0);
        assert_eq!(store.edges_as_child(&child).count(), 0);
        assert!(!store.is_ancestor(&parent, &child));

        // The reverse edge is now allowed.
        store
            .add_relationship(&child, &parent, RelationshipType::ParentChild)
            .unwrap();

        let err = store.remove_relationship(&rel).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "relationship", .. }));
    }

    #[test]
    fn test_remove_person_cascades() {
        let mut store = store();
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        let c = add(&mut store, "C");
        store
            .add_relationship(&a, &b, RelationshipType::ParentChild)
            .unwrap();
        store.add_relationship(&a, &c, RelationshipType::Spouse).unwrap();
        let media = store
            .add_media(MediaData::new("https://img/a.png", MediaType::Image).for_person(a.clone()))
            .unwrap();
        let shared_media = store
            .add_media(MediaData::new("https://img/b.png", MediaType::Image).for_person(b.clone()))
            .unwrap();
        store
            .add_event(EventData::new("Born", "birth").for_person(a.clone()))
            .unwrap();
        let kept_event = store
            .add_event(
                EventData::new("Wedding photo", "marriage")
                    .for_person(b.clone())
                    .with_media(shared_media.clone()),
            )
            .unwrap();

        let report = store.remove_person(&a).unwrap();
        assert_eq!(report.relationships.len(), 2);
        assert_eq!(report.media, vec![media]);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.total(), 5);

        assert!(store.person(&a).is_none());
        assert_eq!(store.relationships().count(), 0);
        assert_eq!(store.edges_as_child(&b).count(), 0);
        assert_eq!(store.spouse_edges(&c).count(), 0);
        assert!(store.event(&kept_event).is_some());
        assert!(store.media(&shared_media).is_some());
    }

    #[test]
    fn test_remove_media_clears_event_reference() {
        let mut store = store();
        let media = store
            .add_media(MediaData::new("https://doc/cert.pdf", MediaType::Document))
            .unwrap();
        let event = store
            .add_event(EventData::new("Certificate", "record").with_media(media.clone()))
            .unwrap();
        store.remove_media(&media).unwrap();
        assert_eq!(store.event(&event).unwrap().data.media_id, None);
    }

    #[test]
    fn test_event_with_missing_media() {
        let mut store = store();
        let err = store
            .add_event(EventData::new("X", "misc").with_media(MediaId::new("m")))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "media", .. }));
    }

    #[test]
    fn test_replace_is_atomic_on_error() {
        let mut store = store();
        let a = add(&mut store, "A");

        let tree = Tree::new("Broken", "owner").with_id(TreeId::new("tree_2"));
        let mut data = TreeData::empty(tree);
        data.relationships.push(Relationship::new(
            TreeId::new("tree_2"),
            PersonId::new("x"),
            PersonId::new("y"),
            RelationshipType::Spouse,
        ));

        assert!(matches!(store.replace(data), Err(Error::Validation(_))));
        assert!(store.person(&a).is_some());
        assert_eq!(store.tree_id().as_str(), "tree_1");
    }

    #[test]
    fn test_from_tree_data_preserves_order_and_indices() {
        let mut source = store();
        let a = add(&mut source, "A");
        let b = add(&mut source, "B");
        let c = add(&mut source, "C");
        source
            .add_relationship(&a, &c, RelationshipType::ParentChild)
            .unwrap();
        source
            .add_relationship(&b, &c, RelationshipType::ParentChild)
            .unwrap();

        let mut snapshot = source.snapshot();
        snapshot.tree = Some(Tree::new("Family", "owner").with_id(TreeId::new("tree_1")));
        let data = TreeData {
            tree: snapshot.tree.clone().unwrap(),
            people: snapshot.people,
            relationships: snapshot.relationships,
            events: snapshot.events,
            media: snapshot.media,
        };

        let loaded = GraphStore::from_tree_data(data).unwrap();
        let names: Vec<_> = loaded.people().map(|p| p.data.first_name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        let parents: Vec<_> = loaded.edges_as_child(&c).map(|r| r.person_a.clone()).collect();
        assert_eq!(parents, [a, b]);
    }

    #[test]
    fn test_loaded_self_edge_is_accepted() {
        let tree = Tree::new("Odd", "owner").with_id(TreeId::new("tree_1"));
        let person = Person::new(TreeId::new("tree_1"), PersonData::named("Loop", "Y"))
            .with_id(PersonId::new("p"));
        let mut data = TreeData::empty(tree);
        data.people.push(person);
        data.relationships.push(Relationship::new(
            TreeId::new("tree_1"),
            PersonId::new("p"),
            PersonId::new("p"),
            RelationshipType::ParentChild,
        ));
        let store = GraphStore::from_tree_data(data).unwrap();
        assert_eq!(store.relationships().count(), 1);
        // The cycle walk terminates on malformed data.
        assert!(store.is_ancestor(&PersonId::new("p"), &PersonId::new("p")));
    }

    #[test]
    fn test_foreign_tree_records_rejected() {
        let tree = Tree::new("Mine", "owner").with_id(TreeId::new("tree_1"));
        let mut data = TreeData::empty(tree);
        data.people.push(Person::new(
            TreeId::new("tree_other"),
            PersonData::named("Stray", "Z"),
        ));
        assert!(matches!(
            GraphStore::from_tree_data(data),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_stats() {
        let mut store = store();
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        let c = store
            .add_person(PersonData::named("C", "Test").died("1990", None))
            .unwrap();
        store.add_relationship(&a, &b, RelationshipType::Spouse).unwrap();
        store
            .add_relationship(&a, &c, RelationshipType::ParentChild)
            .unwrap();
        let stats = store.stats();
        assert_eq!(stats.person_count, 3);
        assert_eq!(stats.relationship_count, 2);
        assert_eq!(stats.parent_child_count, 1);
        assert_eq!(stats.spouse_count, 1);
        assert_eq!(stats.living_count, 2);
    }

    #[test]
    fn test_apply_person_after_removal_is_ignored() {
        let mut store = store();
        let a = add(&mut store, "A");
        let echo = store.person(&a).unwrap().clone();
        store.remove_person(&a).unwrap();
        assert!(!store.apply_person(echo));
        assert!(store.person(&a).is_none());
    }
}
