//! In-memory family graph.
//!
//! [`GraphStore`] owns a tree's collections and keeps id-based indices in
//! step with every mutation, so relationship queries never scan.
//!
//! | Operation | Cost |
//! |-----------|------|
//! | person / relationship lookup | O(1) |
//! | parents, children, spouses of a person | O(edges of that person) |
//! | `is_ancestor` | O(ancestors) |
//! | `remove_person` | O(relationships + events + media) |

mod store;

pub use store::{GraphStats, GraphStore, RemovalReport};
