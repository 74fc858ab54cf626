//! Per-structure connection index.
//!
//! Cross references from a structure's atoms and rings to the entities that
//! depend on them. The index is derived data: every entry is registered when
//! the owning entity is inserted and unregistered when it is removed, and
//! empty buckets are dropped so a maintained index always equals one rebuilt
//! from scratch.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{
    Annotation, AtomId, ControlPointId, Endpoint, HydrophobicContact, HydrophobicId, IntermolecularKey,
    IntermolecularKind, AnnotationId, RingId,
};

/// Atom/ring → dependent entity lookups for one structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionIndex {
    atom_annotations: BTreeMap<AtomId, BTreeSet<AnnotationId>>,
    structure_annotations: BTreeSet<AnnotationId>,
    atom_hydrophobic: BTreeMap<AtomId, BTreeMap<HydrophobicId, BTreeSet<ControlPointId>>>,
    structure_hydrophobic: BTreeSet<HydrophobicId>,
    atom_intermolecular: BTreeMap<AtomId, BTreeSet<IntermolecularKey>>,
    ring_intermolecular: BTreeMap<RingId, BTreeSet<IntermolecularKey>>,
    structure_intermolecular: BTreeSet<IntermolecularKey>,
}

fn remove_from<K: Ord, V: Ord>(map: &mut BTreeMap<K, BTreeSet<V>>, key: &K, value: &V) {
    if let Some(set) = map.get_mut(key) {
        set.remove(value);
        if set.is_empty() {
            map.remove(key);
        }
    }
}

impl ConnectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing references this structure.
    pub fn is_empty(&self) -> bool {
        self.structure_annotations.is_empty()
            && self.structure_hydrophobic.is_empty()
            && self.structure_intermolecular.is_empty()
    }

    // === Registration ===

    pub fn register_annotation(&mut self, annotation: &Annotation) {
        self.structure_annotations.insert(annotation.id);
        for atom in &annotation.atom_links {
            self.atom_annotations.entry(*atom).or_default().insert(annotation.id);
        }
    }

    pub fn unregister_annotation(&mut self, annotation: &Annotation) {
        self.structure_annotations.remove(&annotation.id);
        for atom in &annotation.atom_links {
            remove_from(&mut self.atom_annotations, atom, &annotation.id);
        }
    }

    pub fn register_hydrophobic(&mut self, contact: &HydrophobicContact) {
        self.structure_hydrophobic.insert(contact.id);
        for cp in &contact.control_points {
            for atom in &cp.atom_links {
                self.atom_hydrophobic
                    .entry(*atom)
                    .or_default()
                    .entry(contact.id)
                    .or_default()
                    .insert(cp.id);
            }
        }
    }

    pub fn unregister_hydrophobic(&mut self, contact: &HydrophobicContact) {
        self.structure_hydrophobic.remove(&contact.id);
        for cp in &contact.control_points {
            for atom in &cp.atom_links {
                if let Some(by_spline) = self.atom_hydrophobic.get_mut(atom) {
                    remove_from(by_spline, &contact.id, &cp.id);
                    if by_spline.is_empty() {
                        self.atom_hydrophobic.remove(atom);
                    }
                }
            }
        }
    }

    /// Register one end of an intermolecular edge that lies in this
    /// structure. Annotation endpoints are indexed at scene level.
    pub fn register_intermolecular(&mut self, key: IntermolecularKey, endpoint: Endpoint) {
        self.structure_intermolecular.insert(key);
        match endpoint {
            Endpoint::Atom(atom) => {
                self.atom_intermolecular.entry(atom).or_default().insert(key);
            }
            Endpoint::Ring(ring) => {
                self.ring_intermolecular.entry(ring).or_default().insert(key);
            }
            Endpoint::Annotation(_) => {}
        }
    }

    /// Drop one end of an intermolecular edge. Both ends of a
    /// self-structure edge unregister separately; the structure-level entry
    /// goes with the last one.
    pub fn unregister_intermolecular(&mut self, key: IntermolecularKey, endpoint: Endpoint) {
        match endpoint {
            Endpoint::Atom(atom) => remove_from(&mut self.atom_intermolecular, &atom, &key),
            Endpoint::Ring(ring) => remove_from(&mut self.ring_intermolecular, &ring, &key),
            Endpoint::Annotation(_) => {}
        }
        let still_indexed = self.atom_intermolecular.values().any(|s| s.contains(&key))
            || self.ring_intermolecular.values().any(|s| s.contains(&key));
        if !still_indexed {
            self.structure_intermolecular.remove(&key);
        }
    }

    // === Lookups ===

    /// Annotations attached to the structure.
    pub fn annotations(&self) -> &BTreeSet<AnnotationId> {
        &self.structure_annotations
    }

    /// Annotations linked to any of `atoms`.
    pub fn annotations_of_atoms(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<AnnotationId> {
        atoms
            .iter()
            .filter_map(|a| self.atom_annotations.get(a))
            .flatten()
            .copied()
            .collect()
    }

    /// Splines belonging to the structure.
    pub fn hydrophobic_contacts(&self) -> &BTreeSet<HydrophobicId> {
        &self.structure_hydrophobic
    }

    /// Control points linked to any of `atoms`, grouped by spline.
    pub fn control_points_of_atoms(
        &self,
        atoms: &BTreeSet<AtomId>,
    ) -> BTreeMap<HydrophobicId, BTreeSet<ControlPointId>> {
        let mut out: BTreeMap<HydrophobicId, BTreeSet<ControlPointId>> = BTreeMap::new();
        for by_spline in atoms.iter().filter_map(|a| self.atom_hydrophobic.get(a)) {
            for (spline, points) in by_spline {
                out.entry(*spline).or_default().extend(points.iter().copied());
            }
        }
        out
    }

    /// Every intermolecular edge with an end in the structure.
    pub fn intermolecular(&self) -> &BTreeSet<IntermolecularKey> {
        &self.structure_intermolecular
    }

    /// Intermolecular edges of `kind` with an end in the structure.
    pub fn intermolecular_of_kind(&self, kind: IntermolecularKind) -> BTreeSet<IntermolecularKey> {
        self.structure_intermolecular
            .iter()
            .filter(|k| k.kind == kind)
            .copied()
            .collect()
    }

    /// Intermolecular edges of `kind` ending on any of `atoms`.
    pub fn intermolecular_of_atoms(
        &self,
        atoms: &BTreeSet<AtomId>,
        kind: IntermolecularKind,
    ) -> BTreeSet<IntermolecularKey> {
        atoms
            .iter()
            .filter_map(|a| self.atom_intermolecular.get(a))
            .flatten()
            .filter(|k| k.kind == kind)
            .copied()
            .collect()
    }

    /// Intermolecular edges of `kind` ending on any of `rings`.
    pub fn intermolecular_of_rings(
        &self,
        rings: &BTreeSet<RingId>,
        kind: IntermolecularKind,
    ) -> BTreeSet<IntermolecularKey> {
        rings
            .iter()
            .filter_map(|r| self.ring_intermolecular.get(r))
            .flatten()
            .filter(|k| k.kind == kind)
            .copied()
            .collect()
    }

    /// Atoms with any indexed dependant.
    pub fn linked_atoms(&self) -> BTreeSet<AtomId> {
        self.atom_annotations
            .keys()
            .chain(self.atom_hydrophobic.keys())
            .chain(self.atom_intermolecular.keys())
            .copied()
            .collect()
    }

    /// Rings with indexed intermolecular edges.
    pub fn linked_rings(&self) -> BTreeSet<RingId> {
        self.ring_intermolecular.keys().copied().collect()
    }
}
