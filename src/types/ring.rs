//! Rings and ring systems derived from a structure's bond graph.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::{AtomId, RingId, RingSystemId};

/// A simple cycle of atoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    /// Identifier, unique within the structure.
    pub id: RingId,
    /// Atoms in cycle order.
    pub atoms: Vec<AtomId>,
}

impl Ring {
    /// Create a ring.
    pub fn new(id: RingId, atoms: Vec<AtomId>) -> Self {
        Self { id, atoms }
    }

    /// Whether the ring contains `atom`.
    pub fn contains(&self, atom: AtomId) -> bool {
        self.atoms.contains(&atom)
    }

    /// Ring atoms as a set.
    pub fn atom_set(&self) -> BTreeSet<AtomId> {
        self.atoms.iter().copied().collect()
    }

    /// Mean of the given member positions; used as the anchor of ring
    /// endpoints of intermolecular edges.
    pub fn centroid<F>(&self, position: F) -> Option<DVec2>
    where
        F: Fn(AtomId) -> Option<DVec2>,
    {
        let points: Vec<DVec2> = self.atoms.iter().filter_map(|a| position(*a)).collect();
        if points.is_empty() {
            return None;
        }
        Some(points.iter().copied().sum::<DVec2>() / points.len() as f64)
    }
}

/// Maximal union of rings sharing atoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSystem {
    /// Identifier, unique within the structure.
    pub id: RingSystemId,
    /// Atoms of all member rings.
    pub atoms: BTreeSet<AtomId>,
    /// Member rings.
    pub rings: BTreeSet<RingId>,
}

impl RingSystem {
    /// Create a ring system.
    pub fn new(id: RingSystemId, atoms: BTreeSet<AtomId>, rings: BTreeSet<RingId>) -> Self {
        Self { id, atoms, rings }
    }
}
