//! Drawing capability implemented by the presentation layer.

use super::viewport::Point;
use crate::models::{Person, RelationshipType};

/// Kind of edge being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Parent above, child below.
    ParentChild,
    /// Partners within a row.
    Spouse,
}

impl From<RelationshipType> for EdgeKind {
    fn from(relationship_type: RelationshipType) -> Self {
        match relationship_type {
            RelationshipType::ParentChild => Self::ParentChild,
            RelationshipType::Spouse => Self::Spouse,
        }
    }
}

/// Something that can draw a family graph.
///
/// The engine only ever calls these three operations, always with view-space
/// coordinates. Canvas, SVG, or terminal backends live outside this crate.
pub trait RenderSurface {
    /// Clears everything drawn so far.
    fn clear(&mut self);

    /// Draws a person centered at `at`.
    fn draw_node(&mut self, person: &Person, at: Point, scale: f64);

    /// Draws an edge between two view-space points.
    fn draw_edge(&mut self, from: Point, to: Point, kind: EdgeKind);
}
