//! Business logic services.
//!
//! Services read from the [`GraphStore`](crate::GraphStore) and orchestrate
//! it with persistence.

pub mod layout;
mod resolver;
mod session;

pub use layout::{Bounds, Layout, LayoutConfig, LayoutEngine, NodePosition, PlacedNode};
pub use resolver::RelationshipResolver;
pub use session::GraphSession;
