//! Ring perception.
//!
//! Rings are found from DFS back edges: each back edge closes one
//! fundamental cycle through the DFS tree. Fundamental cycles of fused
//! systems can be envelopes (naphthalene yields the 10-cycle), so the set
//! is then reduced: whenever the symmetric difference of two cycles is a
//! single shorter simple cycle, it replaces the longer one.

use std::collections::{BTreeMap, BTreeSet};

use super::AtomGraph;
use crate::traversal::{traverse, DfsVisitor, TraversalOptions, VisitFlow};
use crate::types::{AtomId, EdgeId};

#[derive(Default)]
struct CycleCollector {
    parent_edge: BTreeMap<AtomId, EdgeId>,
    back_edges: Vec<(AtomId, AtomId, EdgeId)>,
}

impl DfsVisitor for CycleCollector {
    fn edge_visit(&mut self, _from: AtomId, to: AtomId, edge: EdgeId) -> VisitFlow {
        self.parent_edge.insert(to, edge);
        VisitFlow::Continue
    }

    fn back_edge_visit(&mut self, from: AtomId, to: AtomId, edge: EdgeId) {
        self.back_edges.push((from, to, edge));
    }
}

/// Path from `atom` up to the DFS root as `(atom, edge to parent)` pairs.
fn root_path(
    atom: AtomId,
    parents: &BTreeMap<AtomId, Option<AtomId>>,
    parent_edge: &BTreeMap<AtomId, EdgeId>,
) -> Vec<(AtomId, Option<EdgeId>)> {
    let mut path = Vec::new();
    let mut current = Some(atom);
    while let Some(a) = current {
        path.push((a, parent_edge.get(&a).copied()));
        current = parents.get(&a).copied().flatten();
    }
    path
}

fn edge_endpoints<G: AtomGraph + ?Sized>(graph: &G) -> BTreeMap<EdgeId, (AtomId, AtomId)> {
    let mut ends = BTreeMap::new();
    for atom in graph.atom_ids() {
        for n in graph.neighbors_of(atom) {
            ends.entry(n.edge).or_insert((atom.min(n.atom), atom.max(n.atom)));
        }
    }
    ends
}

/// Ordered atoms of `edges` if they form exactly one simple cycle.
fn as_simple_cycle(
    edges: &BTreeSet<EdgeId>,
    ends: &BTreeMap<EdgeId, (AtomId, AtomId)>,
) -> Option<Vec<AtomId>> {
    if edges.len() < 3 {
        return None;
    }
    let mut adjacent: BTreeMap<AtomId, Vec<AtomId>> = BTreeMap::new();
    for e in edges {
        let (a, b) = *ends.get(e)?;
        adjacent.entry(a).or_default().push(b);
        adjacent.entry(b).or_default().push(a);
    }
    if adjacent.values().any(|n| n.len() != 2) || adjacent.len() != edges.len() {
        return None;
    }

    let start = *adjacent.keys().next()?;
    let first_step = adjacent.get(&start)?.iter().copied().min()?;
    let mut cycle = vec![start];
    let (mut prev, mut current) = (start, first_step);
    while current != start {
        cycle.push(current);
        let next = adjacent
            .get(&current)?
            .iter()
            .copied()
            .find(|n| *n != prev)?;
        prev = current;
        current = next;
        if cycle.len() > edges.len() {
            return None;
        }
    }
    // A walk that closes early means several disjoint cycles.
    (cycle.len() == edges.len()).then_some(cycle)
}

/// Perceive the rings of `graph` as ordered atom cycles, smallest first.
pub fn perceive_rings<G: AtomGraph + ?Sized>(graph: &G) -> Vec<Vec<AtomId>> {
    let mut collector = CycleCollector::default();
    let report = traverse(graph, &mut collector, &TraversalOptions::covering(graph));
    if collector.back_edges.is_empty() {
        return Vec::new();
    }

    let mut cycles: Vec<BTreeSet<EdgeId>> = Vec::new();
    for (from, to, edge) in &collector.back_edges {
        let from_path = root_path(*from, &report.visited, &collector.parent_edge);
        let to_path = root_path(*to, &report.visited, &collector.parent_edge);
        let to_atoms: BTreeSet<AtomId> = to_path.iter().map(|(a, _)| *a).collect();
        let from_atoms: BTreeSet<AtomId> = from_path.iter().map(|(a, _)| *a).collect();

        let mut cycle: BTreeSet<EdgeId> = BTreeSet::new();
        cycle.insert(*edge);
        for (atom, parent_edge) in &from_path {
            if to_atoms.contains(atom) {
                break;
            }
            cycle.extend(*parent_edge);
        }
        for (atom, parent_edge) in &to_path {
            if from_atoms.contains(atom) {
                break;
            }
            cycle.extend(*parent_edge);
        }
        cycles.push(cycle);
    }

    let ends = edge_endpoints(graph);
    reduce_cycles(&mut cycles, &ends);

    let mut rings: Vec<Vec<AtomId>> = cycles
        .iter()
        .filter_map(|c| as_simple_cycle(c, &ends))
        .collect();
    rings.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    rings.dedup();
    rings
}

fn reduce_cycles(cycles: &mut Vec<BTreeSet<EdgeId>>, ends: &BTreeMap<EdgeId, (AtomId, AtomId)>) {
    loop {
        cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        let mut replaced = false;
        'outer: for j in 0..cycles.len() {
            for i in 0..cycles.len() {
                if i == j || cycles[i].len() > cycles[j].len() || cycles[i].is_disjoint(&cycles[j]) {
                    continue;
                }
                let diff: BTreeSet<EdgeId> = cycles[i].symmetric_difference(&cycles[j]).copied().collect();
                if diff.len() < cycles[j].len()
                    && !cycles.contains(&diff)
                    && as_simple_cycle(&diff, ends).is_some()
                {
                    cycles[j] = diff;
                    replaced = true;
                    break 'outer;
                }
            }
        }
        // Every replacement shrinks the total edge count, so this ends.
        if !replaced {
            return;
        }
    }
}

/// Group rings into ring systems: rings sharing at least one atom belong
/// together. Input is `(ring index, atoms)`; output lists ring indices per
/// system, ordered by smallest member.
pub fn group_ring_systems(rings: &[BTreeSet<AtomId>]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..rings.len()).collect();

    fn find(parent: &mut [usize], i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut cur = i;
        while parent[cur] != root {
            let next = parent[cur];
            parent[cur] = root;
            cur = next;
        }
        root
    }

    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            if !rings[i].is_disjoint(&rings[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri.max(rj)] = ri.min(rj);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..rings.len() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }
    groups.into_values().collect()
}
