//! Data models for famgraph.
//!
//! This module contains the entities of a family tree and the snapshot type
//! passed between the store, layout engine, and exporters.

mod event;
pub mod graph;
mod ids;
mod person;
mod tree;

pub use event::{Event, EventData, Media, MediaData, MediaType};
pub use graph::{Relationship, RelationshipType};
pub use ids::{EventId, MediaId, PersonId, RelationshipId, TreeId};
pub use person::{Gender, Person, PersonData};
pub use tree::{GraphSnapshot, Tree, TreeData};
