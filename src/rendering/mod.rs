//! Rendering: the viewport transform and the drawing interface.
//!
//! [`render`] is the only place layout, viewport and surface meet. It clears
//! the surface, draws edges first so nodes sit on top, and passes view-space
//! coordinates throughout.

mod surface;
mod viewport;

pub use surface::{EdgeKind, RenderSurface};
pub use viewport::{Point, ViewportConfig, ViewportController};

use crate::models::GraphSnapshot;
use crate::services::Layout;
use tracing::trace;

/// What a render pass drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Nodes drawn.
    pub nodes: usize,
    /// Edges drawn.
    pub edges: usize,
}

/// Draws a laid-out snapshot onto a surface.
///
/// Relationships whose endpoints are missing from the layout, or that point
/// at themselves, are skipped.
pub fn render<S: RenderSurface + ?Sized>(
    snapshot: &GraphSnapshot,
    layout: &Layout,
    viewport: &ViewportController,
    surface: &mut S,
) -> RenderStats {
    let mut stats = RenderStats::default();
    surface.clear();

    for rel in &snapshot.relationships {
        if rel.person_a == rel.person_b {
            continue;
        }
        let (Some(a), Some(b)) = (layout.get(&rel.person_a), layout.get(&rel.person_b)) else {
            continue;
        };
        let from = viewport.to_view(Point::new(a.x, a.y));
        let to = viewport.to_view(Point::new(b.x, b.y));
        surface.draw_edge(from, to, rel.relationship_type.into());
        stats.edges += 1;
    }

    for person in &snapshot.people {
        if let Some(pos) = layout.get(&person.id) {
            let at = viewport.to_view(Point::new(pos.x, pos.y));
            surface.draw_node(person, at, viewport.scale());
            stats.nodes += 1;
        }
    }

    trace!(nodes = stats.nodes, edges = stats.edges, "Rendered snapshot");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, PersonData, RelationshipType, TreeId};
    use crate::services::LayoutEngine;
    use crate::storage::graph::GraphStore;

    #[derive(Default)]
    struct Recorder {
        clears: usize,
        nodes: Vec<(String, Point)>,
        edges: Vec<EdgeKind>,
    }

    impl RenderSurface for Recorder {
        fn clear(&mut self) {
            self.clears += 1;
            self.nodes.clear();
            self.edges.clear();
        }

        fn draw_node(&mut self, person: &Person, at: Point, _scale: f64) {
            self.nodes.push((person.data.first_name.clone(), at));
        }

        fn draw_edge(&mut self, _from: Point, _to: Point, kind: EdgeKind) {
            self.edges.push(kind);
        }
    }

    #[test]
    fn test_render_draws_every_node_and_edge() {
        let mut store = GraphStore::new(TreeId::new("t"));
        let a = store.add_person(PersonData::named("A", "X")).unwrap();
        let b = store.add_person(PersonData::named("B", "X")).unwrap();
        let c = store.add_person(PersonData::named("C", "X")).unwrap();
        store.add_relationship(&a, &b, RelationshipType::Spouse).unwrap();
        store
            .add_relationship(&a, &c, RelationshipType::ParentChild)
            .unwrap();

        let snapshot = store.snapshot();
        let layout = LayoutEngine::default().layout(&snapshot).unwrap();
        let mut viewport = ViewportController::default();
        viewport.pan(100.0, 50.0);

        let mut surface = Recorder::default();
        let stats = render(&snapshot, &layout, &viewport, &mut surface);

        assert_eq!(stats, RenderStats { nodes: 3, edges: 2 });
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.edges, vec![EdgeKind::Spouse, EdgeKind::ParentChild]);

        let a_pos = layout.get(&a).unwrap();
        let (name, at) = &surface.nodes[0];
        assert_eq!(name, "A");
        assert_eq!(*at, Point::new(a_pos.x + 100.0, a_pos.y + 50.0));
    }
}
