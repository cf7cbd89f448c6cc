//! In-memory persistence client.
//!
//! Holds trees in a mutex-guarded map. Used by tests and as a scratch
//! backend; supports one-shot failure injection so callers can exercise
//! transport and permission failures deterministically.

use super::records;
use crate::models::{
    Event, EventId, Media, MediaId, Person, PersonId, Relationship, RelationshipId, Tree,
    TreeData, TreeId,
};
use crate::storage::traits::PersistenceClient;
use crate::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Persistence client that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    trees: Mutex<HashMap<TreeId, TreeData>>,
    failures: Mutex<VecDeque<Error>>,
    operations: Mutex<Vec<&'static str>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, operation: &str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })
}

impl InMemoryPersistence {
    /// Creates an empty client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client pre-populated with trees.
    #[must_use]
    pub fn with_trees(trees: impl IntoIterator<Item = TreeData>) -> Self {
        let client = Self::new();
        if let Ok(mut map) = client.trees.lock() {
            map.extend(trees.into_iter().map(|t| (t.tree.id.clone(), t)));
        }
        client
    }

    /// Makes the next call fail with `error`.
    ///
    /// Queued failures are consumed in order, one per call.
    pub fn fail_next(&self, error: Error) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// Returns the operations served so far, in call order.
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.operations
            .lock()
            .map(|ops| ops.clone())
            .unwrap_or_default()
    }

    /// Returns the stored contents of a tree.
    #[must_use]
    pub fn stored(&self, tree_id: &TreeId) -> Option<TreeData> {
        self.trees.lock().ok()?.get(tree_id).cloned()
    }

    fn begin(&self, operation: &'static str) -> Result<()> {
        lock(&self.operations, operation)?.push(operation);
        match lock(&self.failures, operation)?.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn modify<T>(
        &self,
        operation: &'static str,
        tree_id: &TreeId,
        edit: impl FnOnce(&mut TreeData) -> Result<T>,
    ) -> Result<T> {
        self.begin(operation)?;
        let mut trees = lock(&self.trees, operation)?;
        let data = trees
            .get_mut(tree_id)
            .ok_or_else(|| Error::not_found("tree", tree_id))?;
        // Edit a copy so a failed edit leaves the stored tree unchanged.
        let mut draft = data.clone();
        let out = edit(&mut draft)?;
        *data = draft;
        Ok(out)
    }
}

impl PersistenceClient for InMemoryPersistence {
    async fn load_tree(&self, tree_id: &TreeId) -> Result<TreeData> {
        self.begin("load_tree")?;
        lock(&self.trees, "load_tree")?
            .get(tree_id)
            .cloned()
            .ok_or_else(|| Error::not_found("tree", tree_id))
    }

    async fn create_tree(&self, tree: &Tree) -> Result<Tree> {
        self.begin("create_tree")?;
        let mut trees = lock(&self.trees, "create_tree")?;
        if trees.contains_key(&tree.id) {
            return Err(Error::Validation(format!("tree {} already exists", tree.id)));
        }
        trees.insert(tree.id.clone(), TreeData::empty(tree.clone()));
        Ok(tree.clone())
    }

    async fn list_trees(&self) -> Result<Vec<Tree>> {
        self.begin("list_trees")?;
        let mut trees: Vec<Tree> = lock(&self.trees, "list_trees")?
            .values()
            .map(|d| d.tree.clone())
            .collect();
        trees.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(trees)
    }

    async fn create_person(&self, person: &Person) -> Result<Person> {
        self.modify("create_person", &person.tree_id, |data| {
            records::create_person(data, person)
        })
    }

    async fn update_person(&self, person: &Person) -> Result<Person> {
        self.modify("update_person", &person.tree_id, |data| {
            records::update_person(data, person)
        })
    }

    async fn delete_person(&self, tree_id: &TreeId, id: &PersonId) -> Result<()> {
        self.modify("delete_person", tree_id, |data| records::delete_person(data, id))
    }

    async fn create_relationship(&self, relationship: &Relationship) -> Result<Relationship> {
        self.modify("create_relationship", &relationship.tree_id, |data| {
            records::create_relationship(data, relationship)
        })
    }

    async fn delete_relationship(&self, tree_id: &TreeId, id: &RelationshipId) -> Result<()> {
        self.modify("delete_relationship", tree_id, |data| {
            records::delete_relationship(data, id)
        })
    }

    async fn create_event(&self, event: &Event) -> Result<Event> {
        self.modify("create_event", &event.tree_id, |data| {
            records::create_event(data, event)
        })
    }

    async fn delete_event(&self, tree_id: &TreeId, id: &EventId) -> Result<()> {
        self.modify("delete_event", tree_id, |data| records::delete_event(data, id))
    }

    async fn create_media(&self, media: &Media) -> Result<Media> {
        self.modify("create_media", &media.tree_id, |data| {
            records::create_media(data, media)
        })
    }

    async fn delete_media(&self, tree_id: &TreeId, id: &MediaId) -> Result<()> {
        self.modify("delete_media", tree_id, |data| records::delete_media(data, id))
    }
}
