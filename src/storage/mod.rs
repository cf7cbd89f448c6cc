//! Storage layer.
//!
//! Two layers:
//! - **Graph**: the in-memory, indexed [`GraphStore`](graph::GraphStore) cache
//! - **Persistence**: the durable system of record behind [`PersistenceClient`]
//!   (filesystem JSON or in-memory)

pub mod graph;
pub mod persistence;
pub mod traits;

pub use graph::{GraphStats, GraphStore, RemovalReport};
pub use persistence::{FilesystemPersistence, InMemoryPersistence};
pub use traits::PersistenceClient;
