//! Minimal adjacency-list graph for traversal and ring tests.

use std::collections::BTreeMap;

use super::{AtomGraph, Neighbor};
use crate::types::{AtomId, EdgeId};

#[derive(Debug, Default)]
pub(crate) struct TestGraph {
    adjacency: BTreeMap<AtomId, BTreeMap<EdgeId, AtomId>>,
}

impl TestGraph {
    /// Build from `(from, to, edge)` triples.
    pub(crate) fn from_edges(edges: &[(u32, u32, u32)]) -> Self {
        let mut g = Self::default();
        for &(from, to, edge) in edges {
            let (from, to, edge) = (AtomId::new(from), AtomId::new(to), EdgeId::new(edge));
            g.adjacency.entry(from).or_default().insert(edge, to);
            g.adjacency.entry(to).or_default().insert(edge, from);
        }
        g
    }
}

impl AtomGraph for TestGraph {
    fn atom_ids(&self) -> Vec<AtomId> {
        self.adjacency.keys().copied().collect()
    }

    fn contains_atom(&self, id: AtomId) -> bool {
        self.adjacency.contains_key(&id)
    }

    fn neighbors_of(&self, id: AtomId) -> Vec<Neighbor> {
        self.adjacency
            .get(&id)
            .map(|m| m.iter().map(|(edge, atom)| Neighbor { atom: *atom, edge: *edge }).collect())
            .unwrap_or_default()
    }
}
