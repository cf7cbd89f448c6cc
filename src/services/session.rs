//! Session orchestrating the in-memory store and a persistence client.
//!
//! A [`GraphSession`] owns the [`GraphStore`] for the active tree and
//! forwards validated mutations to a [`PersistenceClient`].
//!
//! # Ordering
//!
//! Persistence calls are the only suspension points and their responses may
//! resolve in any order. Two counters keep late responses from clobbering
//! newer state:
//!
//! | Counter | Scope | Stale response |
//! |---------|-------|----------------|
//! | load generation | per session | load returns [`Error::Conflict`], store untouched |
//! | operation ticket | per entity | persisted echo is discarded |
//!
//! Mutations are optimistic: the store changes before the client is called
//! and a failed call does not revert it. The error is surfaced to the caller.
//!
//! The state lock is never held across an `.await`.

use super::layout::{Layout, LayoutEngine};
use super::resolver::RelationshipResolver;
use crate::io::{ExportFormat, ExportService};
use crate::models::{
    EventData, EventId, GraphSnapshot, MediaData, MediaId, PersonData, PersonId,
    RelationshipId, RelationshipType, Tree, TreeId,
};
use crate::storage::graph::{GraphStats, GraphStore, RemovalReport};
use crate::storage::traits::PersistenceClient;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default)]
struct SessionState {
    store: Option<GraphStore>,
    /// Latest operation ticket per entity key.
    tickets: HashMap<String, u64>,
}

impl SessionState {
    fn store(&self) -> Result<&GraphStore> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::Validation("no tree is loaded".to_string()))
    }

    fn store_mut(&mut self) -> Result<&mut GraphStore> {
        self.store
            .as_mut()
            .ok_or_else(|| Error::Validation("no tree is loaded".to_string()))
    }
}

/// Persistence-backed editing session for one tree at a time.
///
/// All methods take `&self`, so a session can be shared across tasks.
pub struct GraphSession<P: PersistenceClient> {
    client: Arc<P>,
    state: Mutex<SessionState>,
    load_generation: AtomicU64,
    op_counter: AtomicU64,
}

impl<P: PersistenceClient> GraphSession<P> {
    /// Creates a session with no tree loaded.
    pub fn new(client: P) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    /// Creates a session over a shared client.
    #[must_use]
    pub fn with_shared_client(client: Arc<P>) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::default()),
            load_generation: AtomicU64::new(0),
            op_counter: AtomicU64::new(0),
        }
    }

    /// Returns the persistence client.
    #[must_use]
    pub fn client(&self) -> &P {
        &self.client
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_session".to_string(),
            cause: e.to_string(),
        })
    }

    // ========================================================================
    // Trees
    // ========================================================================

    /// Loads a tree, replacing the active one.
    ///
    /// Each call takes a new load generation. If another load starts before
    /// this one's response arrives, this response is discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::Conflict`] if a newer load superseded this one
    /// - [`Error::Validation`] if the persisted tree is malformed
    /// - any error reported by the persistence client
    #[instrument(skip_all, fields(tree_id = %tree_id))]
    pub async fn load(&self, tree_id: &TreeId) -> Result<GraphSnapshot> {
        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Loading tree");

        let response = self.client.load_tree(tree_id).await;

        let mut state = self.lock()?;
        let latest = self.load_generation.load(Ordering::SeqCst);
        if latest != generation {
            warn!(generation, latest, "Discarding stale tree load");
            metrics::counter!("famgraph_loads_discarded_total").increment(1);
            return Err(Error::Conflict(format!(
                "load of tree {tree_id} (generation {generation}) superseded by generation {latest}"
            )));
        }

        let store = GraphStore::from_tree_data(response?)?;
        let snapshot = store.snapshot();
        state.store = Some(store);
        state.tickets.clear();
        info!(
            people = snapshot.people.len(),
            relationships = snapshot.relationships.len(),
            "Loaded tree"
        );
        Ok(snapshot)
    }

    /// Creates a new, empty tree in the persistence layer.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the persistence client.
    pub async fn create_tree(&self, name: &str, owner_id: &str) -> Result<Tree> {
        let tree = Tree::new(name, owner_id);
        let created = self.client.create_tree(&tree).await?;
        info!(tree_id = %created.id, "Created tree");
        Ok(created)
    }

    /// Lists the trees known to the persistence layer.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the persistence client.
    pub async fn list_trees(&self) -> Result<Vec<Tree>> {
        self.client.list_trees().await
    }

    /// Returns the id of the active tree.
    #[must_use]
    pub fn active_tree(&self) -> Option<TreeId> {
        self.lock()
            .ok()?
            .store
            .as_ref()
            .map(|s| s.tree_id().clone())
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Returns a snapshot of the active tree, or an empty one if none is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the session lock is poisoned.
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(self
            .lock()?
            .store
            .as_ref()
            .map_or_else(GraphSnapshot::empty, GraphStore::snapshot))
    }

    /// Runs relationship queries against the active tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if no tree is loaded.
    pub fn query<R>(&self, f: impl FnOnce(RelationshipResolver<'_>) -> R) -> Result<R> {
        let state = self.lock()?;
        Ok(f(RelationshipResolver::new(state.store()?)))
    }

    /// Returns counts for the active tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if no tree is loaded.
    pub fn stats(&self) -> Result<GraphStats> {
        Ok(self.lock()?.store()?.stats())
    }

    /// Lays out the active tree.
    ///
    /// # Errors
    ///
    /// Returns the layout engine's validation error for malformed data.
    pub fn layout(&self, engine: &LayoutEngine) -> Result<Layout> {
        engine.layout(&self.snapshot()?)
    }

    /// Exports the active tree.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        ExportService::new().export(&self.snapshot()?, format)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    fn issue_ticket(&self, state: &mut SessionState, key: String) -> u64 {
        let ticket = self.op_counter.fetch_add(1, Ordering::SeqCst) + 1;
        state.tickets.insert(key, ticket);
        ticket
    }

    /// Applies a persisted echo if its ticket is still the latest for the entity.
    fn reconcile(
        &self,
        key: &str,
        ticket: u64,
        tree_id: &TreeId,
        apply: impl FnOnce(&mut GraphStore) -> bool,
    ) -> Result<()> {
        let mut state = self.lock()?;
        let latest = state.tickets.get(key).copied();
        if latest != Some(ticket) {
            debug!(key, ticket, ?latest, "Discarding stale persistence echo");
            return Ok(());
        }
        state.tickets.remove(key);
        match state.store.as_mut() {
            Some(store) if store.tree_id() == tree_id => {
                if !apply(store) {
                    debug!(key, "Persisted entity no longer present locally");
                }
            },
            _ => debug!(key, "Active tree changed before persistence echo arrived"),
        }
        Ok(())
    }

    /// Finishes an operation whose response carries no echo.
    fn settle<T>(&self, key: &str, ticket: u64, outcome: Result<T>) -> Result<T> {
        if outcome.is_err() {
            if let Ok(mut state) = self.lock() {
                if state.tickets.get(key) == Some(&ticket) {
                    state.tickets.remove(key);
                }
            }
        }
        outcome
    }

    /// Adds a person and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid data (nothing is persisted),
    /// or the persistence error (the person stays in the store).
    #[instrument(skip_all)]
    pub async fn add_person(&self, data: PersonData) -> Result<PersonId> {
        let (person, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            let id = store.add_person(data)?;
            let person = store
                .person(&id)
                .cloned()
                .ok_or_else(|| Error::not_found("person", &id))?;
            let key = format!("person:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (person, key, ticket)
        };

        let outcome = self.client.create_person(&person).await;
        let stored = self.settle(&key, ticket, outcome)?;
        self.reconcile(&key, ticket, &person.tree_id, |store| store.apply_person(stored))?;
        Ok(person.id)
    }

    /// Replaces a person's attributes and persists the change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Validation`] before anything is
    /// persisted, or the persistence error.
    #[instrument(skip_all, fields(person_id = %id))]
    pub async fn update_person(&self, id: &PersonId, data: PersonData) -> Result<()> {
        let (person, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            store.update_person(id, data)?;
            let person = store
                .person(id)
                .cloned()
                .ok_or_else(|| Error::not_found("person", id))?;
            let key = format!("person:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (person, key, ticket)
        };

        let outcome = self.client.update_person(&person).await;
        let stored = self.settle(&key, ticket, outcome)?;
        self.reconcile(&key, ticket, &person.tree_id, |store| store.apply_person(stored))
    }

    /// Removes a person with cascade and persists the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] before anything is persisted, or the
    /// persistence error.
    #[instrument(skip_all, fields(person_id = %id))]
    pub async fn remove_person(&self, id: &PersonId) -> Result<RemovalReport> {
        let (tree_id, report, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            let report = store.remove_person(id)?;
            let tree_id = store.tree_id().clone();
            let key = format!("person:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (tree_id, report, key, ticket)
        };

        let outcome = self.client.delete_person(&tree_id, id).await;
        self.settle(&key, ticket, outcome)?;
        Ok(report)
    }

    /// Adds a relationship and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`], [`Error::NotFound`] or [`Error::Cycle`]
    /// before anything is persisted, or the persistence error.
    #[instrument(skip_all, fields(a = %a, b = %b))]
    pub async fn add_relationship(
        &self,
        a: &PersonId,
        b: &PersonId,
        relationship_type: RelationshipType,
    ) -> Result<RelationshipId> {
        let (rel, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            let id = store.add_relationship(a, b, relationship_type)?;
            let rel = store
                .relationship(&id)
                .cloned()
                .ok_or_else(|| Error::not_found("relationship", &id))?;
            let key = format!("relationship:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (rel, key, ticket)
        };

        let outcome = self.client.create_relationship(&rel).await;
        let stored = self.settle(&key, ticket, outcome)?;
        self.reconcile(&key, ticket, &rel.tree_id, |store| {
            store.apply_relationship(stored)
        })?;
        Ok(rel.id)
    }

    /// Removes a relationship and persists the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] before anything is persisted, or the
    /// persistence error.
    #[instrument(skip_all, fields(relationship_id = %id))]
    pub async fn remove_relationship(&self, id: &RelationshipId) -> Result<()> {
        let (tree_id, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            store.remove_relationship(id)?;
            let tree_id = store.tree_id().clone();
            let key = format!("relationship:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (tree_id, key, ticket)
        };

        let outcome = self.client.delete_relationship(&tree_id, id).await;
        self.settle(&key, ticket, outcome)
    }

    /// Records an event and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or [`Error::NotFound`] before anything is
    /// persisted, or the persistence error.
    #[instrument(skip_all)]
    pub async fn add_event(&self, data: EventData) -> Result<EventId> {
        let (event, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            let id = store.add_event(data)?;
            let event = store
                .event(&id)
                .cloned()
                .ok_or_else(|| Error::not_found("event", &id))?;
            let key = format!("event:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (event, key, ticket)
        };

        let outcome = self.client.create_event(&event).await;
        let stored = self.settle(&key, ticket, outcome)?;
        self.reconcile(&key, ticket, &event.tree_id, |store| store.apply_event(stored))?;
        Ok(event.id)
    }

    /// Removes an event and persists the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] before anything is persisted, or the
    /// persistence error.
    #[instrument(skip_all, fields(event_id = %id))]
    pub async fn remove_event(&self, id: &EventId) -> Result<()> {
        let (tree_id, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            store.remove_event(id)?;
            let tree_id = store.tree_id().clone();
            let key = format!("event:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (tree_id, key, ticket)
        };

        let outcome = self.client.delete_event(&tree_id, id).await;
        self.settle(&key, ticket, outcome)
    }

    /// Registers media and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or [`Error::NotFound`] before anything is
    /// persisted, or the persistence error.
    #[instrument(skip_all)]
    pub async fn add_media(&self, data: MediaData) -> Result<MediaId> {
        let (media, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            let id = store.add_media(data)?;
            let media = store
                .media(&id)
                .cloned()
                .ok_or_else(|| Error::not_found("media", &id))?;
            let key = format!("media:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (media, key, ticket)
        };

        let outcome = self.client.create_media(&media).await;
        let stored = self.settle(&key, ticket, outcome)?;
        self.reconcile(&key, ticket, &media.tree_id, |store| store.apply_media(stored))?;
        Ok(media.id)
    }

    /// Removes media and persists the deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] before anything is persisted, or the
    /// persistence error.
    #[instrument(skip_all, fields(media_id = %id))]
    pub async fn remove_media(&self, id: &MediaId) -> Result<()> {
        let (tree_id, key, ticket) = {
            let mut state = self.lock()?;
            let store = state.store_mut()?;
            store.remove_media(id)?;
            let tree_id = store.tree_id().clone();
            let key = format!("media:{id}");
            let ticket = self.issue_ticket(&mut state, key.clone());
            (tree_id, key, ticket)
        };

        let outcome = self.client.delete_media(&tree_id, id).await;
        self.settle(&key, ticket, outcome)
    }
}
