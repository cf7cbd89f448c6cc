//! Persistence client trait.

use crate::models::{
    Event, EventId, Media, MediaId, Person, PersonId, Relationship, RelationshipId, Tree,
    TreeData, TreeId,
};
use crate::Result;
use std::future::Future;

/// Durable system of record for trees.
///
/// The in-memory [`GraphStore`](crate::GraphStore) is a cache reconciled with a
/// persistence client at load and save boundaries. Every call is a suspension
/// point and responses may resolve in any order.
///
/// Implementations report failures as [`Error::NotFound`](crate::Error::NotFound),
/// [`Error::PermissionDenied`](crate::Error::PermissionDenied) or
/// [`Error::Transport`](crate::Error::Transport).
pub trait PersistenceClient: Send + Sync {
    /// Loads the full contents of a tree.
    fn load_tree(&self, tree_id: &TreeId) -> impl Future<Output = Result<TreeData>> + Send;

    /// Creates an empty tree.
    fn create_tree(&self, tree: &Tree) -> impl Future<Output = Result<Tree>> + Send;

    /// Lists all trees.
    fn list_trees(&self) -> impl Future<Output = Result<Vec<Tree>>> + Send;

    /// Persists a new person and returns the stored version.
    fn create_person(&self, person: &Person) -> impl Future<Output = Result<Person>> + Send;

    /// Persists a changed person and returns the stored version.
    fn update_person(&self, person: &Person) -> impl Future<Output = Result<Person>> + Send;

    /// Deletes a person and everything that references them.
    fn delete_person(
        &self,
        tree_id: &TreeId,
        id: &PersonId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persists a new relationship and returns the stored version.
    fn create_relationship(
        &self,
        relationship: &Relationship,
    ) -> impl Future<Output = Result<Relationship>> + Send;

    /// Deletes a relationship.
    fn delete_relationship(
        &self,
        tree_id: &TreeId,
        id: &RelationshipId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persists a new event and returns the stored version.
    fn create_event(&self, event: &Event) -> impl Future<Output = Result<Event>> + Send;

    /// Deletes an event.
    fn delete_event(
        &self,
        tree_id: &TreeId,
        id: &EventId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persists a new media record and returns the stored version.
    fn create_media(&self, media: &Media) -> impl Future<Output = Result<Media>> + Send;

    /// Deletes a media record.
    fn delete_media(
        &self,
        tree_id: &TreeId,
        id: &MediaId,
    ) -> impl Future<Output = Result<()>> + Send;
}
