//! Deterministic generational layout.
//!
//! [`LayoutEngine::layout`] maps a [`GraphSnapshot`] to 2D positions. The
//! result depends only on the snapshot contents and their insertion order:
//! nothing is randomized, so laying out the same snapshot twice yields equal
//! [`Layout`]s.
//!
//! # Algorithm
//!
//! 1. **Roots**: the first-created person without a parent roots the first
//!    component. People not reached from it form further components, each
//!    rooted at its first-created parentless member.
//! 2. **Generations**: breadth-first from the root. For each person, spouses
//!    share its generation, children are one below, parents one above. The
//!    first assignment wins.
//! 3. **Columns**: each generation keeps a running cursor. A person lands at
//!    the larger of its desired x and the cursor, spouses follow at a fixed
//!    offset, and children are spread evenly under the couple's midpoint.
//! 4. **Rows**: `y = generation * row_height`. Finally every x is shifted so
//!    generation 0 is centered on the origin.

use crate::models::{GraphSnapshot, PersonId, RelationshipType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument};

/// Spacing constants for the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between generations.
    pub row_height: f64,
    /// Horizontal distance between siblings.
    pub sibling_spacing: f64,
    /// Horizontal distance between a person and their spouse.
    pub spouse_offset: f64,
    /// Minimum horizontal distance between unrelated neighbors in a row.
    pub node_spacing: f64,
    /// Horizontal gap between disconnected components.
    pub component_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_height: 150.0,
            sibling_spacing: 180.0,
            spouse_offset: 120.0,
            node_spacing: 180.0,
            component_gap: 240.0,
        }
    }
}

/// Position of one person in model space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodePosition {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Generation relative to the component root (negative above it).
    pub generation: i32,
}

/// Axis-aligned bounding box in model space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

impl Bounds {
    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// A positioned person.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    /// The person.
    pub person_id: PersonId,
    /// Where they are drawn.
    #[serde(flatten)]
    pub position: NodePosition,
}

/// Result of a layout pass, in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    nodes: Vec<PlacedNode>,
    #[serde(skip)]
    index: HashMap<PersonId, usize>,
}

impl Layout {
    /// Returns the position of a person.
    #[must_use]
    pub fn get(&self, id: &PersonId) -> Option<&NodePosition> {
        self.index.get(id).map(|&i| &self.nodes[i].position)
    }

    /// Iterates positions in snapshot order.
    pub fn iter(&self) -> impl Iterator<Item = (&PersonId, &NodePosition)> {
        self.nodes.iter().map(|n| (&n.person_id, &n.position))
    }

    /// Returns the placed nodes in snapshot order.
    #[must_use]
    pub fn nodes(&self) -> &[PlacedNode] {
        &self.nodes
    }

    /// Number of positioned people.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing was positioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct generations, ascending.
    #[must_use]
    pub fn generations(&self) -> Vec<i32> {
        let mut generations: Vec<i32> = self.nodes.iter().map(|n| n.position.generation).collect();
        generations.sort_unstable();
        generations.dedup();
        generations
    }

    /// Returns the bounding box of all positions, or `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?.position;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(self.nodes.iter().fold(init, |b, n| Bounds {
            min_x: b.min_x.min(n.position.x),
            min_y: b.min_y.min(n.position.y),
            max_x: b.max_x.max(n.position.x),
            max_y: b.max_y.max(n.position.y),
        }))
    }
}

/// Computes generational layouts.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Creates an engine with custom spacing.
    #[must_use]
    pub const fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Returns the spacing configuration.
    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out a snapshot.
    ///
    /// An empty snapshot yields an empty layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a relationship references a person
    /// missing from the snapshot.
    #[instrument(skip_all, fields(people = snapshot.people.len()))]
    pub fn layout(&self, snapshot: &GraphSnapshot) -> Result<Layout> {
        let graph = Adjacency::build(snapshot)?;
        if graph.ids.is_empty() {
            return Ok(Layout::default());
        }

        let (generation, components) = assign_generations(&graph);

        let mut placer = Placer {
            config: &self.config,
            graph: &graph,
            generation: &generation,
            x: vec![None; graph.ids.len()],
            cursors: HashMap::new(),
        };
        let mut right_edge: Option<f64> = None;
        for component in &components {
            placer.cursors.clear();
            placer.place_component(component);

            let (lo, hi) = component
                .iter()
                .filter_map(|&p| placer.x[p])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                });
            // Later components start one gap to the right of everything placed.
            let offset = right_edge.map_or(0.0, |edge| edge + self.config.component_gap - lo);
            for &p in component {
                if let Some(x) = placer.x[p].as_mut() {
                    *x += offset;
                }
            }
            right_edge = Some(right_edge.map_or(hi + offset, |edge| edge.max(hi + offset)));
        }

        // Center generation 0 on the origin.
        let (min0, max0) = generation
            .iter()
            .zip(&placer.x)
            .filter(|(g, _)| **g == 0)
            .filter_map(|(_, x)| *x)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        let shift = if min0.is_finite() {
            -(min0 + max0) / 2.0
        } else {
            0.0
        };

        let mut layout = Layout::default();
        for (i, id) in graph.ids.iter().enumerate() {
            let g = generation[i];
            let position = NodePosition {
                x: placer.x[i].unwrap_or(0.0) + shift,
                y: f64::from(g) * self.config.row_height,
                generation: g,
            };
            layout.index.insert((*id).clone(), layout.nodes.len());
            layout.nodes.push(PlacedNode {
                person_id: (*id).clone(),
                position,
            });
        }

        debug!(
            components = components.len(),
            generations = layout.generations().len(),
            "Computed layout"
        );
        Ok(layout)
    }
}

/// Index-based adjacency lists, in relationship-creation order.
struct Adjacency<'s> {
    ids: Vec<&'s PersonId>,
    spouses: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
    parents: Vec<Vec<usize>>,
}

impl<'s> Adjacency<'s> {
    fn build(snapshot: &'s GraphSnapshot) -> Result<Self> {
        let mut index: HashMap<&PersonId, usize> = HashMap::new();
        let mut ids = Vec::new();
        for person in &snapshot.people {
            index.entry(&person.id).or_insert_with(|| {
                ids.push(&person.id);
                ids.len() - 1
            });
        }

        let n = ids.len();
        let mut graph = Self {
            ids,
            spouses: vec![Vec::new(); n],
            children: vec![Vec::new(); n],
            parents: vec![Vec::new(); n],
        };

        for rel in &snapshot.relationships {
            let lookup = |id: &PersonId| {
                index.get(id).copied().ok_or_else(|| {
                    Error::Validation(format!(
                        "relationship {} references person {id} missing from the snapshot",
                        rel.id
                    ))
                })
            };
            let a = lookup(&rel.person_a)?;
            let b = lookup(&rel.person_b)?;
            if a == b {
                continue;
            }
            match rel.relationship_type {
                RelationshipType::ParentChild => {
                    graph.children[a].push(b);
                    graph.parents[b].push(a);
                },
                RelationshipType::Spouse => {
                    graph.spouses[a].push(b);
                    graph.spouses[b].push(a);
                },
            }
        }
        Ok(graph)
    }
}

/// Assigns generations breadth-first, one component at a time.
///
/// Returns each person's generation and the components in traversal order.
fn assign_generations(graph: &Adjacency<'_>) -> (Vec<i32>, Vec<Vec<usize>>) {
    let n = graph.ids.len();
    let mut generation: Vec<Option<i32>> = vec![None; n];
    let mut components = Vec::new();

    loop {
        let root = (0..n)
            .find(|&i| generation[i].is_none() && graph.parents[i].is_empty())
            .or_else(|| (0..n).find(|&i| generation[i].is_none()));
        let Some(root) = root else { break };

        generation[root] = Some(0);
        let mut queue = VecDeque::from([root]);
        let mut order = Vec::new();
        while let Some(p) = queue.pop_front() {
            order.push(p);
            let Some(g) = generation[p] else { continue };
            let steps = [(&graph.spouses[p], g), (&graph.children[p], g + 1), (&graph.parents[p], g - 1)];
            for (neighbors, next) in steps {
                for &q in neighbors {
                    if generation[q].is_none() {
                        generation[q] = Some(next);
                        queue.push_back(q);
                    }
                }
            }
        }
        components.push(order);
    }

    let generation = generation.into_iter().map(|g| g.unwrap_or(0)).collect();
    (generation, components)
}

/// Horizontal placement state.
struct Placer<'a> {
    config: &'a LayoutConfig,
    graph: &'a Adjacency<'a>,
    generation: &'a [i32],
    x: Vec<Option<f64>>,
    cursors: HashMap<i32, f64>,
}

impl Placer<'_> {
    /// Next free x in a generation's row, if the row has anyone yet.
    fn cursor(&self, generation: i32) -> Option<f64> {
        self.cursors.get(&generation).copied()
    }

    fn place_component(&mut self, component: &[usize]) {
        let Some((&root, rest)) = component.split_first() else {
            return;
        };
        self.place_from(root, 0.0);

        // Whoever the downward walk missed (ancestors, in-laws, conflicting
        // generations) is placed near an already placed relative.
        for &p in rest {
            if self.x[p].is_some() {
                continue;
            }
            let graph = self.graph;
            let g = self.generation[p];
            let desired = graph.spouses[p]
                .iter()
                .filter(|&&s| self.generation[s] == g)
                .find_map(|&s| self.x[s])
                .map(|x| x + self.config.spouse_offset)
                .or_else(|| graph.children[p].iter().find_map(|&c| self.x[c]))
                .or_else(|| self.cursor(g))
                .unwrap_or(0.0);
            self.place_from(p, desired);
        }
    }

    /// Places a person, their partners, and then their descendants depth-first.
    #[allow(clippy::cast_precision_loss)]
    fn place_from(&mut self, start: usize, desired: f64) {
        let graph = self.graph;
        let offset = self.config.spouse_offset;
        let mut stack = vec![(start, desired)];

        while let Some((p, desired)) = stack.pop() {
            if self.x[p].is_some() {
                continue;
            }
            let g = self.generation[p];
            let couple = self.couple(p);
            let at = couple.iter().position(|&m| m == p).unwrap_or(0);
            let wanted = (at as f64).mul_add(-offset, desired);
            let first = self.cursor(g).map_or(wanted, |cursor| wanted.max(cursor));
            for (i, &member) in couple.iter().enumerate() {
                self.x[member] = Some((i as f64).mul_add(offset, first));
            }
            let last = ((couple.len() - 1) as f64).mul_add(offset, first);
            self.cursors.insert(g, last + self.config.node_spacing);

            // Children sharing the same parents in this couple form one group.
            let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();
            let mut seen: Vec<usize> = Vec::new();
            for &member in &couple {
                for &c in &graph.children[member] {
                    if self.x[c].is_some() || self.generation[c] != g + 1 || seen.contains(&c) {
                        continue;
                    }
                    seen.push(c);
                    let center = self.child_center(c, &couple);
                    match groups.iter_mut().find(|(x, _)| (*x - center).abs() < 1e-6) {
                        Some((_, kids)) => kids.push(c),
                        None => groups.push((center, vec![c])),
                    }
                }
            }
            groups.sort_by(|a, b| a.0.total_cmp(&b.0));

            let spacing = self.config.sibling_spacing;
            let mut planned = Vec::new();
            for (center, kids) in &groups {
                let start_x = center - (kids.len().saturating_sub(1) as f64) * spacing / 2.0;
                for (i, &kid) in kids.iter().enumerate() {
                    planned.push((kid, (i as f64).mul_add(spacing, start_x)));
                }
            }
            stack.extend(planned.into_iter().rev());
        }
    }

    /// Unplaced partners reachable from `p` within its generation.
    ///
    /// Ordered as a line where each neighbor is a spouse of the next, when
    /// the marriages form one; otherwise in discovery order.
    fn couple(&self, p: usize) -> Vec<usize> {
        let graph = self.graph;
        let g = self.generation[p];
        let mut members = vec![p];
        let mut i = 0;
        while i < members.len() {
            for &s in &graph.spouses[members[i]] {
                if self.x[s].is_none() && self.generation[s] == g && !members.contains(&s) {
                    members.push(s);
                }
            }
            i += 1;
        }

        let joined = |a: usize, b: usize| graph.spouses[a].contains(&b);
        let degree = |m: usize| members.iter().filter(|&&o| o != m && joined(m, o)).count();
        let links = members.iter().map(|&m| degree(m)).sum::<usize>() / 2;
        if links + 1 != members.len() || members.iter().any(|&m| degree(m) > 2) {
            return members;
        }
        let Some(&end) = members.iter().find(|&&m| degree(m) <= 1) else {
            return members;
        };
        let mut line = vec![end];
        while let Some(&next) = members
            .iter()
            .find(|&&m| !line.contains(&m) && line.last().is_some_and(|&l| joined(l, m)))
        {
            line.push(next);
        }
        line
    }

    /// Center for a child: the mean x of their parents in the couple, or of
    /// a lone parent and the partners directly beside them.
    #[allow(clippy::cast_precision_loss)]
    fn child_center(&self, child: usize, couple: &[usize]) -> f64 {
        let graph = self.graph;
        let mut under: Vec<usize> = couple
            .iter()
            .copied()
            .filter(|m| graph.parents[child].contains(m))
            .collect();
        let lone = if under.len() == 1 {
            couple.iter().position(|&m| m == under[0])
        } else {
            None
        };
        if let Some(at) = lone {
            let parent = couple[at];
            let beside = [at.checked_sub(1), Some(at + 1)];
            under.extend(
                beside
                    .into_iter()
                    .flatten()
                    .filter_map(|i| couple.get(i).copied())
                    .filter(|&m| graph.spouses[parent].contains(&m)),
            );
        }
        let xs: Vec<f64> = under.iter().filter_map(|&m| self.x[m]).collect();
        if xs.is_empty() {
            return 0.0;
        }
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PersonData, TreeId};
    use crate::storage::graph::GraphStore;

    const EPS: f64 = 1e-9;

    fn store_with(names: &[&str]) -> (GraphStore, Vec<PersonId>) {
        let mut store = GraphStore::new(TreeId::new("t"));
        let ids = names
            .iter()
            .map(|n| store.add_person(PersonData::named(*n, "L")).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn test_empty_snapshot() {
        let layout = LayoutEngine::default()
            .layout(&GraphSnapshot::empty())
            .unwrap();
        assert!(layout.is_empty());
        assert!(layout.bounds().is_none());
    }

    #[test]
    fn test_spouse_shares_generation() {
        let (mut store, ids) = store_with(&["A", "B", "C"]);
        store
            .add_relationship(&ids[0], &ids[1], RelationshipType::ParentChild)
            .unwrap();
        store
            .add_relationship(&ids[1], &ids[2], RelationshipType::Spouse)
            .unwrap();

        let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
        let gen_of = |i: usize| layout.get(&ids[i]).unwrap().generation;
        assert_eq!((gen_of(0), gen_of(1), gen_of(2)), (0, 1, 1));

        let b = layout.get(&ids[1]).unwrap();
        let c = layout.get(&ids[2]).unwrap();
        assert!((c.x - b.x - 120.0).abs() < EPS);
        assert!((b.y - 150.0).abs() < EPS);
        assert!((layout.get(&ids[0]).unwrap().x).abs() < EPS);
    }

    #[test]
    fn test_children_centered_under_couple() {
        let (mut store, ids) = store_with(&["Mum", "Dad", "K1", "K2"]);
        store
            .add_relationship(&ids[0], &ids[1], RelationshipType::Spouse)
            .unwrap();
        for kid in &ids[2..] {
            store
                .add_relationship(&ids[0], kid, RelationshipType::ParentChild)
                .unwrap();
        }
        let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
        let x = |i: usize| layout.get(&ids[i]).unwrap().x;

        assert!((x(0) + x(1)).abs() < EPS, "couple centered on origin");
        assert!((x(3) - x(2) - 180.0).abs() < EPS);
        assert!((x(2) + x(3)).abs() < EPS, "children centered under couple");
    }

    #[test]
    fn test_second_partner_sits_beside_partner() {
        let (mut store, ids) = store_with(&["Mum", "Dad", "Eve", "Cat"]);
        let spouse = RelationshipType::Spouse;
        let pc = RelationshipType::ParentChild;
        store.add_relationship(&ids[0], &ids[1], spouse).unwrap();
        store.add_relationship(&ids[1], &ids[2], spouse).unwrap();
        store.add_relationship(&ids[1], &ids[3], pc).unwrap();
        store.add_relationship(&ids[2], &ids[3], pc).unwrap();

        let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
        let x = |i: usize| layout.get(&ids[i]).unwrap().x;

        assert!((x(1) - x(0) - 120.0).abs() < EPS);
        assert!((x(2) - x(1) - 120.0).abs() < EPS);
        assert!((x(3) - (x(1) + x(2)) / 2.0).abs() < EPS, "child under own parents");
    }

    #[test]
    fn test_person_with_two_spouses() {
        let (mut store, ids) = store_with(&["Tom", "Maria", "Lucy", "Sasha", "Kate"]);
        let spouse = RelationshipType::Spouse;
        let pc = RelationshipType::ParentChild;
        store.add_relationship(&ids[0], &ids[1], spouse).unwrap();
        store.add_relationship(&ids[0], &ids[2], spouse).unwrap();
        store.add_relationship(&ids[0], &ids[3], pc).unwrap();
        store.add_relationship(&ids[1], &ids[3], pc).unwrap();
        store.add_relationship(&ids[0], &ids[4], pc).unwrap();
        store.add_relationship(&ids[2], &ids[4], pc).unwrap();

        let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
        let x = |i: usize| layout.get(&ids[i]).unwrap().x;
        let (tom, maria, lucy) = (x(0), x(1), x(2));

        // One spouse on each side, both at the spouse offset.
        assert!((tom - maria - 120.0).abs() < EPS);
        assert!((lucy - tom - 120.0).abs() < EPS);
        assert!(tom.abs() < EPS);
        assert!((x(3) - (tom + maria) / 2.0).abs() < EPS);
        assert!((x(4) - (tom + lucy) / 2.0).abs() < EPS);
    }

    #[test]
    fn test_in_laws_get_generation_through_spouse() {
        let (mut store, ids) = store_with(&["A", "B", "C", "D"]);
        store
            .add_relationship(&ids[0], &ids[1], RelationshipType::ParentChild)
            .unwrap();
        store
            .add_relationship(&ids[1], &ids[2], RelationshipType::Spouse)
            .unwrap();
        store
            .add_relationship(&ids[3], &ids[2], RelationshipType::ParentChild)
            .unwrap();

        let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
        assert_eq!(layout.get(&ids[3]).unwrap().generation, 0);
        assert_eq!(layout.generations(), vec![0, 1]);
    }

    #[test]
    fn test_disconnected_component_placed_to_the_right() {
        let (mut store, ids) = store_with(&["A", "B", "Loner"]);
        store
            .add_relationship(&ids[0], &ids[1], RelationshipType::Spouse)
            .unwrap();

        let layout = LayoutEngine::default().layout(&store.snapshot()).unwrap();
        let a = layout.get(&ids[0]).unwrap().x;
        let b = layout.get(&ids[1]).unwrap().x;
        let loner = layout.get(&ids[2]).unwrap();
        assert_eq!(loner.generation, 0);
        assert!((loner.x - b - 240.0).abs() < EPS);
        assert!(a < b);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let (mut store, ids) = store_with(&["A", "B", "C", "D", "E"]);
        store
            .add_relationship(&ids[0], &ids[2], RelationshipType::ParentChild)
            .unwrap();
        store
            .add_relationship(&ids[1], &ids[2], RelationshipType::ParentChild)
            .unwrap();
        store
            .add_relationship(&ids[2], &ids[3], RelationshipType::Spouse)
            .unwrap();
        let snapshot = store.snapshot();
        let engine = LayoutEngine::default();
        assert_eq!(engine.layout(&snapshot).unwrap(), engine.layout(&snapshot).unwrap());
        assert_eq!(engine.layout(&snapshot).unwrap().len(), 5);
    }

    #[test]
    fn test_dangling_relationship_rejected() {
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .add_relationship(&ids[0], &ids[1], RelationshipType::ParentChild)
            .unwrap();
        let mut snapshot = store.snapshot();
        snapshot.people.truncate(1);
        let err = LayoutEngine::default().layout(&snapshot).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_custom_row_height() {
        let (mut store, ids) = store_with(&["A", "B"]);
        store
            .add_relationship(&ids[0], &ids[1], RelationshipType::ParentChild)
            .unwrap();
        let engine = LayoutEngine::new(LayoutConfig {
            row_height: 100.0,
            ..LayoutConfig::default()
        });
        let layout = engine.layout(&store.snapshot()).unwrap();
        assert!((layout.get(&ids[1]).unwrap().y - 100.0).abs() < EPS);
        let bounds = layout.bounds().unwrap();
        assert!((bounds.height() - 100.0).abs() < EPS);
    }
}
