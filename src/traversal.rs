//! Generic depth-first traversal over an atom graph.
//!
//! The engine walks any [`AtomGraph`] and reports what it sees through a
//! [`DfsVisitor`]. It classifies every edge incident to a visited atom
//! exactly once:
//!
//! ```text
//! far endpoint unvisited  → tree edge   (edge_visit, may prune)
//! far endpoint visited    → back edge   (back_edge_visit)
//! edge already classified → repeat      (repeat_edge_visit)
//! ```
//!
//! Excluded atoms count as visited from the start: they are never entered
//! and edges leading to them classify as back edges. The engine does no
//! geometry and touches no state except through the visitor.

use std::collections::{BTreeMap, BTreeSet};

use crate::store::{AtomGraph, Neighbor};
use crate::types::{AtomId, EdgeId};

/// What the traversal should do after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    /// Keep going.
    Continue,
    /// Do not descend below this atom/edge; continue elsewhere.
    Prune,
    /// Stop the whole traversal.
    Abort,
}

/// Classification of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeClass {
    /// Led to an unvisited atom.
    Tree,
    /// Led to an atom that was already visited (or excluded).
    Back,
}

/// Non-fatal problems encountered while traversing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalDiagnostic {
    /// A requested start atom does not exist in the graph.
    InvalidStart(AtomId),
    /// A requested start atom is in the excluded set.
    ExcludedStart(AtomId),
}

/// Hooks invoked during traversal. Every method defaults to a no-op.
pub trait DfsVisitor {
    /// A start atom opened a new component (before it is visited).
    fn on_new_component(&mut self, _start: AtomId, _component: usize) {}

    /// An atom is entered. `Prune` skips its neighbours.
    fn atom_visit(&mut self, _atom: AtomId, _parent: Option<AtomId>) -> VisitFlow {
        VisitFlow::Continue
    }

    /// A tree edge is about to be followed. `Prune` leaves `to` unentered.
    fn edge_visit(&mut self, _from: AtomId, _to: AtomId, _edge: EdgeId) -> VisitFlow {
        VisitFlow::Continue
    }

    /// A back edge was found.
    fn back_edge_visit(&mut self, _from: AtomId, _to: AtomId, _edge: EdgeId) {}

    /// An already classified edge was met again from its other side.
    fn repeat_edge_visit(&mut self, _from: AtomId, _to: AtomId, _edge: EdgeId) {}

    /// Reorder the neighbours of `atom` before they are scanned.
    fn order_neighbors(&mut self, _atom: AtomId, _parent: Option<AtomId>, _neighbors: &mut [Neighbor]) {}

    /// Runs once at the end with the full visitation record.
    fn on_finish(&mut self, _report: &TraversalReport) {}
}

/// Visitor that only records; useful for reachability queries.
#[derive(Debug, Default)]
pub struct NoopVisitor;

impl DfsVisitor for NoopVisitor {}

/// Start atoms and exclusions for a traversal.
#[derive(Debug, Clone, Default)]
pub struct TraversalOptions {
    /// Start atoms in order. Empty means "the first atom of the graph".
    pub start_ids: Vec<AtomId>,
    /// Atoms treated as already visited.
    pub excluded_atoms: BTreeSet<AtomId>,
}

impl TraversalOptions {
    /// Start from a single atom.
    pub fn from_atom(start: AtomId) -> Self {
        Self {
            start_ids: vec![start],
            ..Self::default()
        }
    }

    /// Start from every atom so all components are covered.
    pub fn covering<G: AtomGraph + ?Sized>(graph: &G) -> Self {
        Self {
            start_ids: graph.atom_ids(),
            ..Self::default()
        }
    }

    /// Builder: exclude atoms.
    pub fn excluding(mut self, atoms: impl IntoIterator<Item = AtomId>) -> Self {
        self.excluded_atoms.extend(atoms);
        self
    }
}

/// Everything the traversal saw.
#[derive(Debug, Clone, Default)]
pub struct TraversalReport {
    /// Visited atoms mapped to their DFS parent.
    pub visited: BTreeMap<AtomId, Option<AtomId>>,
    /// Atoms in the order they were entered.
    pub order: Vec<AtomId>,
    /// Classification of every edge met.
    pub edges: BTreeMap<EdgeId, EdgeClass>,
    /// Number of components opened.
    pub components: usize,
    /// Skipped starts.
    pub diagnostics: Vec<TraversalDiagnostic>,
    /// Whether a callback aborted the traversal.
    pub aborted: bool,
}

impl TraversalReport {
    /// Edges classified as tree edges.
    pub fn tree_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().filter(|(_, c)| **c == EdgeClass::Tree).map(|(e, _)| *e)
    }

    /// Edges classified as back edges.
    pub fn back_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().filter(|(_, c)| **c == EdgeClass::Back).map(|(e, _)| *e)
    }

    /// Whether `atom` was visited.
    pub fn reached(&self, atom: AtomId) -> bool {
        self.visited.contains_key(&atom)
    }
}

struct Frame {
    atom: AtomId,
    neighbors: Vec<Neighbor>,
    next: usize,
}

struct Dfs<'a, G: AtomGraph + ?Sized, V: DfsVisitor + ?Sized> {
    graph: &'a G,
    visitor: &'a mut V,
    excluded: &'a BTreeSet<AtomId>,
    report: TraversalReport,
    stack: Vec<Frame>,
}

impl<'a, G: AtomGraph + ?Sized, V: DfsVisitor + ?Sized> Dfs<'a, G, V> {
    /// Enter `atom`; pushes a frame unless the visitor prunes.
    fn enter(&mut self, atom: AtomId, parent: Option<AtomId>) -> VisitFlow {
        self.report.visited.insert(atom, parent);
        self.report.order.push(atom);
        let flow = self.visitor.atom_visit(atom, parent);
        if flow == VisitFlow::Continue {
            let mut neighbors = self.graph.neighbors_of(atom);
            self.visitor.order_neighbors(atom, parent, &mut neighbors);
            self.stack.push(Frame {
                atom,
                neighbors,
                next: 0,
            });
        }
        flow
    }

    fn is_settled(&self, atom: AtomId) -> bool {
        self.report.visited.contains_key(&atom) || self.excluded.contains(&atom)
    }

    /// Run the descent from the current stack until it empties.
    fn descend(&mut self) -> VisitFlow {
        while let Some(frame) = self.stack.last_mut() {
            if frame.next >= frame.neighbors.len() {
                self.stack.pop();
                continue;
            }
            let Neighbor { atom: to, edge } = frame.neighbors[frame.next];
            frame.next += 1;
            let from = frame.atom;

            if self.report.edges.contains_key(&edge) {
                self.visitor.repeat_edge_visit(from, to, edge);
                continue;
            }

            if self.is_settled(to) {
                self.report.edges.insert(edge, EdgeClass::Back);
                self.visitor.back_edge_visit(from, to, edge);
                continue;
            }

            self.report.edges.insert(edge, EdgeClass::Tree);
            match self.visitor.edge_visit(from, to, edge) {
                VisitFlow::Abort => return VisitFlow::Abort,
                VisitFlow::Prune => continue,
                VisitFlow::Continue => {}
            }
            if self.enter(to, Some(from)) == VisitFlow::Abort {
                return VisitFlow::Abort;
            }
        }
        VisitFlow::Continue
    }
}

/// Depth-first traversal of `graph`.
///
/// Each start that exists, is not excluded and has not been reached yet
/// opens a new component. Missing starts are skipped with a diagnostic.
pub fn traverse<G, V>(graph: &G, visitor: &mut V, options: &TraversalOptions) -> TraversalReport
where
    G: AtomGraph + ?Sized,
    V: DfsVisitor + ?Sized,
{
    let starts: Vec<AtomId> = if options.start_ids.is_empty() {
        graph.atom_ids().into_iter().take(1).collect()
    } else {
        options.start_ids.clone()
    };

    let mut dfs = Dfs {
        graph,
        visitor,
        excluded: &options.excluded_atoms,
        report: TraversalReport::default(),
        stack: Vec::new(),
    };

    for start in starts {
        if !dfs.graph.contains_atom(start) {
            tracing::warn!(atom = %start, "Skipping traversal start: atom does not exist");
            dfs.report.diagnostics.push(TraversalDiagnostic::InvalidStart(start));
            continue;
        }
        if dfs.excluded.contains(&start) {
            dfs.report.diagnostics.push(TraversalDiagnostic::ExcludedStart(start));
            continue;
        }
        if dfs.report.visited.contains_key(&start) {
            continue;
        }

        let component = dfs.report.components;
        dfs.report.components += 1;
        dfs.visitor.on_new_component(start, component);

        if dfs.enter(start, None) == VisitFlow::Abort || dfs.descend() == VisitFlow::Abort {
            dfs.report.aborted = true;
            dfs.stack.clear();
            break;
        }
    }

    let Dfs { visitor, report, .. } = dfs;
    visitor.on_finish(&report);
    report
}

/// Atoms reachable from `start` without passing through `excluded`.
pub fn reachable_atoms<G: AtomGraph + ?Sized>(
    graph: &G,
    start: AtomId,
    excluded: &BTreeSet<AtomId>,
) -> BTreeSet<AtomId> {
    let options = TraversalOptions {
        start_ids: vec![start],
        excluded_atoms: excluded.clone(),
    };
    traverse(graph, &mut NoopVisitor, &options).visited.into_keys().collect()
}

/// Connected components, each as a sorted atom set.
pub fn connected_components<G: AtomGraph + ?Sized>(graph: &G) -> Vec<BTreeSet<AtomId>> {
    #[derive(Default)]
    struct Components(Vec<BTreeSet<AtomId>>);

    impl DfsVisitor for Components {
        fn on_new_component(&mut self, _start: AtomId, _component: usize) {
            self.0.push(BTreeSet::new());
        }

        fn atom_visit(&mut self, atom: AtomId, _parent: Option<AtomId>) -> VisitFlow {
            if let Some(current) = self.0.last_mut() {
                current.insert(atom);
            }
            VisitFlow::Continue
        }
    }

    let mut components = Components::default();
    traverse(graph, &mut components, &TraversalOptions::covering(graph));
    components.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_graph::TestGraph;

    /// 1-2-3-1 triangle with a tail 3-4, plus isolated pair 10-11.
    fn sample() -> TestGraph {
        TestGraph::from_edges(&[(1, 2, 1), (2, 3, 2), (3, 1, 3), (3, 4, 4), (10, 11, 5)])
    }

    #[derive(Default)]
    struct Recorder {
        components: Vec<(AtomId, usize)>,
        tree: Vec<EdgeId>,
        back: Vec<EdgeId>,
        repeats: Vec<EdgeId>,
        finished: bool,
        prune_at: Option<AtomId>,
        abort_at: Option<AtomId>,
    }

    impl DfsVisitor for Recorder {
        fn on_new_component(&mut self, start: AtomId, component: usize) {
            self.components.push((start, component));
        }
        fn atom_visit(&mut self, atom: AtomId, _parent: Option<AtomId>) -> VisitFlow {
            if Some(atom) == self.abort_at {
                VisitFlow::Abort
            } else if Some(atom) == self.prune_at {
                VisitFlow::Prune
            } else {
                VisitFlow::Continue
            }
        }
        fn edge_visit(&mut self, _from: AtomId, _to: AtomId, edge: EdgeId) -> VisitFlow {
            self.tree.push(edge);
            VisitFlow::Continue
        }
        fn back_edge_visit(&mut self, _from: AtomId, _to: AtomId, edge: EdgeId) {
            self.back.push(edge);
        }
        fn repeat_edge_visit(&mut self, _from: AtomId, _to: AtomId, edge: EdgeId) {
            self.repeats.push(edge);
        }
        fn on_finish(&mut self, _report: &TraversalReport) {
            self.finished = true;
        }
    }

    fn a(n: u32) -> AtomId {
        AtomId::new(n)
    }

    #[test]
    fn test_default_start_visits_first_component_only() {
        let g = sample();
        let mut rec = Recorder::default();
        let report = traverse(&g, &mut rec, &TraversalOptions::default());
        assert_eq!(report.visited.len(), 4);
        assert_eq!(report.components, 1);
        assert!(rec.finished);
    }

    #[test]
    fn test_covering_classifies_every_edge_once() {
        let g = sample();
        let mut rec = Recorder::default();
        let report = traverse(&g, &mut rec, &TraversalOptions::covering(&g));
        assert_eq!(report.visited.len(), 6);
        assert_eq!(report.components, 2);
        assert_eq!(rec.tree.len() + rec.back.len(), 5);
        assert_eq!(rec.back.len(), 1);
        // Every edge is met twice in an undirected walk.
        assert_eq!(rec.repeats.len(), 5);
        assert_eq!(rec.components, vec![(a(1), 0), (a(10), 1)]);
    }

    #[test]
    fn test_exclusion_removes_only_excluded_atom() {
        let g = sample();
        let mut rec = Recorder::default();
        let opts = TraversalOptions::from_atom(a(1)).excluding([a(4)]);
        let report = traverse(&g, &mut rec, &opts);
        assert!(!report.reached(a(4)));
        assert_eq!(report.visited.len(), 3);
        // The bond into the excluded atom is a back edge, never a tree edge.
        assert_eq!(report.edges.get(&EdgeId::new(4)), Some(&EdgeClass::Back));
        assert!(!rec.tree.contains(&EdgeId::new(4)));
    }

    #[test]
    fn test_atom_prune_skips_subtree() {
        let g = TestGraph::from_edges(&[(1, 2, 1), (2, 3, 2)]);
        let mut rec = Recorder {
            prune_at: Some(a(2)),
            ..Recorder::default()
        };
        let report = traverse(&g, &mut rec, &TraversalOptions::from_atom(a(1)));
        assert!(report.reached(a(2)));
        assert!(!report.reached(a(3)));
        assert!(!report.aborted);
    }

    #[test]
    fn test_abort_stops_everything() {
        let g = sample();
        let mut rec = Recorder {
            abort_at: Some(a(2)),
            ..Recorder::default()
        };
        let report = traverse(&g, &mut rec, &TraversalOptions::covering(&g));
        assert!(report.aborted);
        assert!(!report.reached(a(10)));
        assert!(rec.finished);
    }

    #[test]
    fn test_invalid_start_is_skipped() {
        let g = sample();
        let opts = TraversalOptions {
            start_ids: vec![a(99), a(10)],
            ..TraversalOptions::default()
        };
        let report = traverse(&g, &mut NoopVisitor, &opts);
        assert_eq!(report.diagnostics, vec![TraversalDiagnostic::InvalidStart(a(99))]);
        assert_eq!(report.visited.len(), 2);
    }

    #[test]
    fn test_neighbor_order_controls_visit_order() {
        struct Reverse;
        impl DfsVisitor for Reverse {
            fn order_neighbors(&mut self, _atom: AtomId, _parent: Option<AtomId>, n: &mut [Neighbor]) {
                n.sort_by(|x, y| y.atom.cmp(&x.atom));
            }
        }
        let g = TestGraph::from_edges(&[(1, 2, 1), (1, 3, 2)]);
        let report = traverse(&g, &mut Reverse, &TraversalOptions::from_atom(a(1)));
        assert_eq!(report.order, vec![a(1), a(3), a(2)]);
    }

    #[test]
    fn test_components_and_reachability() {
        let g = sample();
        let comps = connected_components(&g);
        assert_eq!(comps.len(), 2);
        let side = reachable_atoms(&g, a(4), &[a(3)].into_iter().collect());
        assert_eq!(side, [a(4)].into_iter().collect());
    }
}
