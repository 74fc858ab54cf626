//! Per-structure atom/bond store.
//!
//! A [`Structure`] owns its atoms, bonds, rings and ring systems and keeps an
//! ordered adjacency map that is always the symmetric closure of the bond
//! set. Mutations that change connectivity (`add_edge`, `without_atoms`)
//! update adjacency in the same call, so the two can never drift apart.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::rings::{group_ring_systems, perceive_rings};
use super::{AtomGraph, Neighbor};
use crate::boundary::BoundaryTracker;
use crate::error::{EntityKind, Result, SceneError};
use crate::types::{Atom, AtomId, Edge, EdgeId, Limits, Ring, RingId, RingSystem, RingSystemId, StructureId};

/// What a structure depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Small molecule.
    #[default]
    Ligand,
    /// Protein or nucleic acid residue.
    Residue,
    /// Metal ion.
    Metal,
    /// Water molecule.
    Water,
    /// Anything else.
    Other,
}

impl StructureKind {
    /// Parse kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ligand" | "" => Some(Self::Ligand),
            "residue" | "aminoacid" | "nucleotide" => Some(Self::Residue),
            "metal" => Some(Self::Metal),
            "water" => Some(Self::Water),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ligand => write!(f, "ligand"),
            Self::Residue => write!(f, "residue"),
            Self::Metal => write!(f, "metal"),
            Self::Water => write!(f, "water"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// How a structure is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Full atom/bond graph.
    #[default]
    Full,
    /// Collapsed to a labelled circle.
    Circle,
}

impl Representation {
    /// The other representation.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Full => Self::Circle,
            Self::Circle => Self::Full,
        }
    }
}

/// One structure of the scene.
#[derive(Debug, Clone, Serialize)]
pub struct Structure {
    /// Scene-wide unique id.
    pub id: StructureId,
    /// Display name (residue label, ligand code).
    pub name: String,
    /// What the structure depicts.
    pub kind: StructureKind,
    /// Current representation.
    pub representation: Representation,
    /// Accumulated offset of whole-structure moves.
    pub movement_offset: DVec2,
    atoms: BTreeMap<AtomId, Atom>,
    edges: BTreeMap<EdgeId, Edge>,
    adjacency: BTreeMap<AtomId, BTreeMap<EdgeId, AtomId>>,
    rings: BTreeMap<RingId, Ring>,
    ring_systems: BTreeMap<RingSystemId, RingSystem>,
    #[serde(skip)]
    boundary: BoundaryTracker,
}

impl Structure {
    /// Create an empty structure.
    pub fn new(id: StructureId, name: impl Into<String>, kind: StructureKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            representation: Representation::default(),
            movement_offset: DVec2::ZERO,
            atoms: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            rings: BTreeMap::new(),
            ring_systems: BTreeMap::new(),
            boundary: BoundaryTracker::new(),
        }
    }

    // === Queries ===

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(&id)
    }

    pub(crate) fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn ring(&self, id: RingId) -> Option<&Ring> {
        self.rings.get(&id)
    }

    /// Atoms in id order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.atoms.values()
    }

    /// Bonds in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    /// Rings in id order.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.rings.values()
    }

    /// Ring systems in id order.
    pub fn ring_systems(&self) -> impl Iterator<Item = &RingSystem> + '_ {
        self.ring_systems.values()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Current bounds over committed atom coordinates.
    pub fn limits(&self) -> Option<Limits> {
        self.boundary.limits()
    }

    pub fn boundary(&self) -> &BoundaryTracker {
        &self.boundary
    }

    /// Centroid of a ring from committed coordinates.
    pub fn ring_centroid(&self, id: RingId) -> Option<DVec2> {
        self.rings
            .get(&id)?
            .centroid(|a| self.atoms.get(&a).map(|atom| atom.coordinates))
    }

    /// Bonds with at least one endpoint in `atoms`.
    pub fn incident_edges(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<EdgeId> {
        atoms
            .iter()
            .filter_map(|a| self.adjacency.get(a))
            .flat_map(|m| m.keys().copied())
            .collect()
    }

    /// Rings containing at least one of `atoms`.
    pub fn rings_touching(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<RingId> {
        self.rings
            .values()
            .filter(|r| r.atoms.iter().any(|a| atoms.contains(a)))
            .map(|r| r.id)
            .collect()
    }

    /// Ring systems containing at least one of `atoms`.
    pub fn ring_systems_of_atoms(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<RingSystemId> {
        self.ring_systems
            .values()
            .filter(|s| !s.atoms.is_disjoint(atoms))
            .map(|s| s.id)
            .collect()
    }

    /// All rings of the given ring systems.
    pub fn rings_of_systems(&self, systems: &BTreeSet<RingSystemId>) -> BTreeSet<RingId> {
        systems
            .iter()
            .filter_map(|s| self.ring_systems.get(s))
            .flat_map(|s| s.rings.iter().copied())
            .collect()
    }

    // === Construction ===

    /// Insert an atom.
    pub fn add_atom(&mut self, atom: Atom) -> Result<()> {
        if self.atoms.contains_key(&atom.id) {
            return Err(SceneError::duplicate(EntityKind::Atom, atom.id.value()));
        }
        self.adjacency.entry(atom.id).or_default();
        self.atoms.insert(atom.id, atom);
        Ok(())
    }

    /// Insert a bond. Both endpoints must already be in this structure.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(SceneError::duplicate(EntityKind::Edge, edge.id.value()));
        }
        for end in [edge.from, edge.to] {
            if !self.atoms.contains_key(&end) {
                return Err(SceneError::dangling(edge.id, end));
            }
        }
        if edge.from == edge.to {
            return Err(SceneError::dangling(edge.id, format!("distinct partner of {}", edge.from)));
        }
        self.adjacency.entry(edge.from).or_default().insert(edge.id, edge.to);
        self.adjacency.entry(edge.to).or_default().insert(edge.id, edge.from);
        self.edges.insert(edge.id, edge);
        Ok(())
    }

    /// Insert a supplied ring. Its atoms must exist.
    pub fn add_ring(&mut self, ring: Ring) -> Result<()> {
        if self.rings.contains_key(&ring.id) {
            return Err(SceneError::duplicate(EntityKind::Ring, ring.id.value()));
        }
        if let Some(missing) = ring.atoms.iter().find(|a| !self.atoms.contains_key(a)) {
            return Err(SceneError::dangling(ring.id, missing));
        }
        self.rings.insert(ring.id, ring);
        Ok(())
    }

    /// Insert a supplied ring system. Its rings must exist; its atom set is
    /// completed from them.
    pub fn add_ring_system(&mut self, mut system: RingSystem) -> Result<()> {
        if self.ring_systems.contains_key(&system.id) {
            return Err(SceneError::duplicate(EntityKind::RingSystem, system.id.value()));
        }
        for ring_id in &system.rings {
            let ring = self
                .rings
                .get(ring_id)
                .ok_or_else(|| SceneError::dangling(system.id, ring_id))?;
            system.atoms.extend(ring.atoms.iter().copied());
        }
        self.ring_systems.insert(system.id, system);
        Ok(())
    }

    /// Recompute rings from the bond graph.
    ///
    /// Rings whose atom set is unchanged keep their id; new rings get ids
    /// after the current maximum.
    pub fn perceive_rings(&mut self) {
        let known: BTreeMap<BTreeSet<AtomId>, RingId> =
            self.rings.values().map(|r| (r.atom_set(), r.id)).collect();
        let mut next_id = self.rings.keys().next_back().map(|id| id.next()).unwrap_or_default();

        let mut rings = BTreeMap::new();
        for cycle in perceive_rings(&*self) {
            let set: BTreeSet<AtomId> = cycle.iter().copied().collect();
            let id = match known.get(&set) {
                Some(id) => *id,
                None => {
                    let id = next_id;
                    next_id = next_id.next();
                    id
                }
            };
            rings.insert(id, Ring::new(id, cycle));
        }
        tracing::trace!(structure = %self.id, rings = rings.len(), "Perceived rings");
        self.rings = rings;
        self.refresh_ring_systems();
    }

    /// Recompute ring systems and bond `cyclic` flags from the current rings.
    pub fn refresh_ring_systems(&mut self) {
        let ring_ids: Vec<RingId> = self.rings.keys().copied().collect();
        let sets: Vec<BTreeSet<AtomId>> = self.rings.values().map(|r| r.atom_set()).collect();
        let owner_of: BTreeMap<RingId, RingSystemId> = self
            .ring_systems
            .values()
            .flat_map(|s| s.rings.iter().map(move |r| (*r, s.id)))
            .collect();
        let mut next_id = self
            .ring_systems
            .keys()
            .next_back()
            .map(|id| id.next())
            .unwrap_or_default();

        let mut systems = BTreeMap::new();
        for group in group_ring_systems(&sets) {
            let rings: BTreeSet<RingId> = group.iter().map(|i| ring_ids[*i]).collect();
            let atoms: BTreeSet<AtomId> = group.iter().flat_map(|i| sets[*i].iter().copied()).collect();
            let reused = rings
                .iter()
                .filter_map(|r| owner_of.get(r))
                .find(|id| !systems.contains_key(*id))
                .copied();
            let id = reused.unwrap_or_else(|| {
                let id = next_id;
                next_id = next_id.next();
                id
            });
            systems.insert(id, RingSystem::new(id, atoms, rings));
        }
        self.ring_systems = systems;

        let ring_bonds: BTreeSet<(AtomId, AtomId)> = self
            .rings
            .values()
            .flat_map(|r| {
                let n = r.atoms.len();
                (0..n).map(move |i| {
                    let (a, b) = (r.atoms[i], r.atoms[(i + 1) % n]);
                    (a.min(b), a.max(b))
                })
            })
            .collect();
        for edge in self.edges.values_mut() {
            edge.cyclic = ring_bonds.contains(&(edge.from.min(edge.to), edge.from.max(edge.to)));
        }
    }

    /// Recompute derived atom orientation from neighbour geometry.
    pub fn post_process_atoms(&mut self) {
        let positions: BTreeMap<AtomId, Vec<DVec2>> = self
            .adjacency
            .iter()
            .map(|(atom, neighbors)| {
                let pos = neighbors
                    .values()
                    .filter_map(|n| self.atoms.get(n))
                    .map(|a| a.coordinates)
                    .collect();
                (*atom, pos)
            })
            .collect();
        for (id, atom) in self.atoms.iter_mut() {
            let neighbors = positions.get(id).map(Vec::as_slice).unwrap_or(&[]);
            atom.orient(neighbors);
        }
    }

    /// Full rescan of the bounds.
    pub fn calc_boundaries(&mut self) {
        self.boundary
            .calc_boundaries(self.atoms.values().map(|a| Limits::from_point(a.coordinates)));
    }

    pub(crate) fn reset_boundary_changes(&mut self) {
        self.boundary.reset_change_dirs();
    }

    /// Move one atom's committed position, updating bounds incrementally.
    /// Returns the previous position.
    pub(crate) fn move_atom(&mut self, id: AtomId, to: DVec2) -> Option<DVec2> {
        let atom = self.atoms.get_mut(&id)?;
        let from = atom.coordinates;
        atom.coordinates = to;
        self.boundary
            .set_maxes(&Limits::from_point(from), &Limits::from_point(to));
        Some(from)
    }

    // === Derived copies ===

    /// Copy of this structure with `removed` atoms, their bonds and every
    /// ring containing them taken out.
    pub fn without_atoms(&self, removed: &BTreeSet<AtomId>) -> Structure {
        let mut copy = self.clone();
        let dropped_edges = self.incident_edges(removed);
        let dropped_rings = self.rings_touching(removed);

        for edge_id in &dropped_edges {
            if let Some(edge) = copy.edges.remove(edge_id) {
                for end in [edge.from, edge.to] {
                    if let Some(m) = copy.adjacency.get_mut(&end) {
                        m.remove(edge_id);
                    }
                }
            }
        }
        for atom in removed {
            copy.atoms.remove(atom);
            copy.adjacency.remove(atom);
        }
        for ring in &dropped_rings {
            copy.rings.remove(ring);
        }
        copy.refresh_ring_systems();
        copy.post_process_atoms();
        copy.calc_boundaries();
        copy
    }

    /// Copy with `atoms` reflected about the vertical line `x = axis_x`.
    /// Wedge bonds with both ends reflected swap direction.
    pub fn mirrored(&self, atoms: &BTreeSet<AtomId>, axis_x: f64) -> Structure {
        let mut copy = self.clone();
        for id in atoms {
            if let Some(atom) = copy.atoms.get_mut(id) {
                atom.coordinates.x = 2.0 * axis_x - atom.coordinates.x;
            }
        }
        for edge in copy.edges.values_mut() {
            if atoms.contains(&edge.from) && atoms.contains(&edge.to) {
                edge.bond_type = edge.bond_type.mirrored();
            }
        }
        copy.post_process_atoms();
        copy.calc_boundaries();
        copy
    }

    /// Copy with additional atoms and bonds; rings are re-perceived.
    pub fn extended(&self, atoms: Vec<Atom>, edges: Vec<Edge>) -> Result<Structure> {
        let mut copy = self.clone();
        for atom in atoms {
            copy.add_atom(atom)?;
        }
        for edge in edges {
            copy.add_edge(edge)?;
        }
        copy.perceive_rings();
        copy.post_process_atoms();
        copy.calc_boundaries();
        Ok(copy)
    }

    /// Invariant violations: bond endpoints and adjacency symmetry.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for edge in self.edges.values() {
            for (end, other) in [(edge.from, edge.to), (edge.to, edge.from)] {
                if !self.atoms.contains_key(&end) {
                    out.push(format!("{} in {} references missing {}", edge.id, self.id, end));
                }
                if self.adjacency.get(&end).and_then(|m| m.get(&edge.id)) != Some(&other) {
                    out.push(format!("{} missing from adjacency of {}", edge.id, end));
                }
            }
        }
        for (atom, neighbors) in &self.adjacency {
            if !self.atoms.contains_key(atom) {
                out.push(format!("adjacency of {} lists missing {}", self.id, atom));
            }
            for edge_id in neighbors.keys() {
                if !self.edges.contains_key(edge_id) {
                    out.push(format!("adjacency of {} lists missing {}", atom, edge_id));
                }
            }
        }
        for ring in self.rings.values() {
            if let Some(missing) = ring.atoms.iter().find(|a| !self.atoms.contains_key(a)) {
                out.push(format!("{} in {} references missing {}", ring.id, self.id, missing));
            }
        }
        out
    }
}

impl AtomGraph for Structure {
    fn atom_ids(&self) -> Vec<AtomId> {
        self.atoms.keys().copied().collect()
    }

    fn contains_atom(&self, id: AtomId) -> bool {
        self.atoms.contains_key(&id)
    }

    fn neighbors_of(&self, id: AtomId) -> Vec<Neighbor> {
        self.adjacency
            .get(&id)
            .map(|m| m.iter().map(|(edge, atom)| Neighbor { atom: *atom, edge: *edge }).collect())
            .unwrap_or_default()
    }
}
