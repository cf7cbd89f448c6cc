//! # Famgraph
//!
//! A family-graph engine for genealogy applications.
//!
//! Famgraph keeps an in-memory graph of people, their typed relationships,
//! life events and media, answers relationship queries over it, computes a
//! deterministic generational layout, maps layout coordinates through a
//! pan/zoom viewport, and exports trees to interchange formats.
//!
//! ## Features
//!
//! - Indexed in-memory [`GraphStore`] with cascade deletes and cycle checks
//! - Parent/child/spouse/sibling queries via [`RelationshipResolver`]
//! - Reproducible generational layout via [`LayoutEngine`]
//! - Pan/zoom transform via [`ViewportController`]
//! - Structured document, GEDCOM-style genealogy text, and CSV export
//! - Async [`GraphSession`] that reconciles local edits with a persistence client
//!
//! ## Example
//!
//! ```rust
//! use famgraph::models::{PersonData, RelationshipType, TreeId};
//! use famgraph::{GraphStore, LayoutEngine, RelationshipResolver};
//!
//! let mut store = GraphStore::new(TreeId::new("tree_1"));
//! let parent = store.add_person(PersonData::named("Ada", "Lovelace")).unwrap();
//! let child = store.add_person(PersonData::named("Byron", "King")).unwrap();
//! store
//!     .add_relationship(&parent, &child, RelationshipType::ParentChild)
//!     .unwrap();
//!
//! let resolver = RelationshipResolver::new(&store);
//! assert_eq!(resolver.parents(&child)[0].id, parent);
//!
//! let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
//! assert_eq!(layout.get(&child).map(|p| p.generation), Some(1));
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod storage;

pub use config::FamgraphConfig;
pub use io::{ExportFormat, ExportService};
pub use models::{GraphSnapshot, Person, PersonId, Relationship, RelationshipType, TreeId};
pub use rendering::{RenderSurface, ViewportController};
pub use services::{GraphSession, Layout, LayoutEngine, RelationshipResolver};
pub use storage::graph::GraphStore;
pub use storage::traits::PersistenceClient;

/// Error type for famgraph operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Validation` | Missing required name, self-relationship, duplicate edge, malformed snapshot |
/// | `NotFound` | A referenced person, relationship, event, media record or tree is absent |
/// | `Cycle` | A parent-child edge would make a person their own ancestor |
/// | `PermissionDenied` | The persistence client refused the operation |
/// | `Transport` | A persistence call failed in flight |
/// | `Conflict` | A generation-tagged load response arrived after a newer load |
/// | `OperationFailed` | Local I/O, configuration or serialization failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// A parent-child relationship would create an ancestor cycle.
    #[error("relationship {parent} -> {child} would make a person their own ancestor")]
    Cycle {
        /// Proposed parent.
        parent: String,
        /// Proposed child.
        child: String,
    },

    /// The persistence layer refused the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A persistence call failed.
    #[error("transport error during '{operation}': {cause}")]
    Transport {
        /// The persistence operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A response was discarded because a newer request superseded it.
    #[error("stale response discarded: {0}")]
    Conflict(String),

    /// A local operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] error.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true if retrying the same call might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Result type alias for famgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
