//! Scene aggregate root.
//!
//! The [`Scene`] owns every structure, annotation, hydrophobic contact and
//! intermolecular edge, plus the derived data kept in step with them:
//! owner maps (atom/bond → structure), per-structure connection indices,
//! the annotation → intermolecular link table, the selection and the global
//! bounds tracker.
//!
//! All mutating methods validate first and return an error before touching
//! state; once validation passes the mutation cannot fail.

use glam::DVec2;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::index::ConnectionIndex;
use super::structure::{Representation, Structure, StructureKind};
use super::{AtomGraph, Neighbor};
use crate::boundary::{BoundaryTracker, FixedLimits};
use crate::edit::SceneFragment;
use crate::error::{EntityKind, Result, SceneError};
use crate::types::{
    Annotation, AnnotationId, Atom, AtomId, ControlPointId, Edge, EdgeId, Endpoint, HydrophobicContact,
    HydrophobicId, IntermolecularEdge, IntermolecularId, IntermolecularKey, IntermolecularKind, Limits, RingId,
    RingSystemId, StructureId,
};

/// Something with a position that an edit can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PositionKey {
    /// Atom coordinates.
    Atom(AtomId),
    /// Annotation centre.
    Annotation(AnnotationId),
    /// One spline control point.
    ControlPoint(HydrophobicId, ControlPointId),
    /// Movement offset accumulator of a structure.
    StructureOffset(StructureId),
}

/// Region whose bounds were rescanned after an incremental update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BoundsRegion {
    /// The whole scene.
    Scene,
    /// One structure.
    Structure(StructureId),
}

/// Committed selection plus in-progress (temporary) changes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    committed: BTreeSet<AtomId>,
    temp_added: BTreeSet<AtomId>,
    temp_removed: BTreeSet<AtomId>,
}

impl Selection {
    /// Committed selection.
    pub fn committed(&self) -> &BTreeSet<AtomId> {
        &self.committed
    }

    /// Selection as currently shown: committed with temporary changes.
    pub fn effective(&self) -> BTreeSet<AtomId> {
        self.committed
            .difference(&self.temp_removed)
            .chain(self.temp_added.iter())
            .copied()
            .collect()
    }

    /// Whether temporary changes are pending.
    pub fn has_temporary(&self) -> bool {
        !self.temp_added.is_empty() || !self.temp_removed.is_empty()
    }

    fn select(&mut self, atom: AtomId, temporary: bool) {
        if temporary {
            self.temp_removed.remove(&atom);
            if !self.committed.contains(&atom) {
                self.temp_added.insert(atom);
            }
        } else {
            self.committed.insert(atom);
        }
    }

    fn unselect(&mut self, atom: AtomId, temporary: bool) {
        if temporary {
            self.temp_added.remove(&atom);
            if self.committed.contains(&atom) {
                self.temp_removed.insert(atom);
            }
        } else {
            self.committed.remove(&atom);
        }
    }

    fn forget(&mut self, atoms: &BTreeSet<AtomId>) {
        for atom in atoms {
            self.committed.remove(atom);
            self.temp_added.remove(atom);
            self.temp_removed.remove(atom);
        }
    }
}

/// Summary of one structure for the "additional information" query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureInfo {
    pub id: StructureId,
    pub name: String,
    pub kind: StructureKind,
    pub representation: Representation,
    pub atom_count: usize,
    pub edge_count: usize,
    pub ring_count: usize,
    pub selected_atoms: usize,
    pub annotations: usize,
    pub hydrophobic_contacts: usize,
    /// Intermolecular edge count per kind; kinds with none are omitted.
    pub interactions: BTreeMap<IntermolecularKind, usize>,
}

/// Every id owned by or indexed to a structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureIds {
    pub atoms: BTreeSet<AtomId>,
    pub edges: BTreeSet<EdgeId>,
    pub rings: BTreeSet<RingId>,
    pub ring_systems: BTreeSet<RingSystemId>,
    pub annotations: BTreeSet<AnnotationId>,
    pub hydrophobic_contacts: BTreeSet<HydrophobicId>,
    pub intermolecular: BTreeSet<IntermolecularKey>,
}

/// Persistent state serialized for fingerprinting.
#[derive(Serialize)]
pub(crate) struct SceneSnapshot<'a> {
    structures: Vec<&'a Structure>,
    annotations: Vec<&'a Annotation>,
    hydrophobic_contacts: Vec<&'a HydrophobicContact>,
    intermolecular: Vec<&'a IntermolecularEdge>,
    connections: &'a BTreeMap<StructureId, ConnectionIndex>,
    annotation_links: &'a BTreeMap<AnnotationId, BTreeSet<IntermolecularKey>>,
    selection: &'a BTreeSet<AtomId>,
}

/// The aggregate root.
#[derive(Debug, Clone)]
pub struct Scene {
    structures: BTreeMap<StructureId, Structure>,
    atom_owner: BTreeMap<AtomId, StructureId>,
    edge_owner: BTreeMap<EdgeId, StructureId>,
    annotations: BTreeMap<AnnotationId, Annotation>,
    hydrophobic_contacts: BTreeMap<HydrophobicId, HydrophobicContact>,
    intermolecular: BTreeMap<IntermolecularKey, IntermolecularEdge>,
    connections: BTreeMap<StructureId, ConnectionIndex>,
    annotation_links: BTreeMap<AnnotationId, BTreeSet<IntermolecularKey>>,
    selection: Selection,
    boundary: BoundaryTracker,
    rescans: Vec<BoundsRegion>,
    spline_samples: usize,
    stroke_radius: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with default spline sampling (8 samples, radius 2.0).
    pub fn new() -> Self {
        Self::with_curve_settings(8, 2.0)
    }

    /// Empty scene with explicit spline sampling parameters.
    pub fn with_curve_settings(samples_per_segment: usize, stroke_radius: f64) -> Self {
        Self {
            structures: BTreeMap::new(),
            atom_owner: BTreeMap::new(),
            edge_owner: BTreeMap::new(),
            annotations: BTreeMap::new(),
            hydrophobic_contacts: BTreeMap::new(),
            intermolecular: BTreeMap::new(),
            connections: BTreeMap::new(),
            annotation_links: BTreeMap::new(),
            selection: Selection::default(),
            boundary: BoundaryTracker::new(),
            rescans: Vec::new(),
            spline_samples: samples_per_segment,
            stroke_radius,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
            && self.annotations.is_empty()
            && self.hydrophobic_contacts.is_empty()
            && self.intermolecular.is_empty()
    }

    /// All structures in id order.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> + '_ {
        self.structures.values()
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    /// Structure owning `atom`.
    pub fn structure_of_atom(&self, atom: AtomId) -> Option<StructureId> {
        self.atom_owner.get(&atom).copied()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.structures.get(self.atom_owner.get(&id)?)?.atom(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.structures.get(self.edge_owner.get(&id)?)?.edge(id)
    }

    /// Neighbours of an atom, ordered by bond id. Empty for unknown atoms.
    pub fn neighbors_of(&self, atom: AtomId) -> Vec<Neighbor> {
        self.atom_owner
            .get(&atom)
            .and_then(|s| self.structures.get(s))
            .map(|s| s.neighbors_of(atom))
            .unwrap_or_default()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.values()
    }

    pub fn hydrophobic_contact(&self, id: HydrophobicId) -> Option<&HydrophobicContact> {
        self.hydrophobic_contacts.get(&id)
    }

    pub fn hydrophobic_contacts(&self) -> impl Iterator<Item = &HydrophobicContact> + '_ {
        self.hydrophobic_contacts.values()
    }

    pub fn intermolecular(&self, key: IntermolecularKey) -> Option<&IntermolecularEdge> {
        self.intermolecular.get(&key)
    }

    /// Look up an intermolecular edge by kind and id.
    pub fn intermolecular_by_type(&self, kind: IntermolecularKind, id: IntermolecularId) -> Option<&IntermolecularEdge> {
        self.intermolecular.get(&IntermolecularKey::new(kind, id))
    }

    /// All intermolecular edges of one kind, in id order.
    pub fn intermolecular_of_kind(&self, kind: IntermolecularKind) -> impl Iterator<Item = &IntermolecularEdge> + '_ {
        self.intermolecular.values().filter(move |e| e.kind == kind)
    }

    /// All intermolecular edges, grouped by kind then id.
    pub fn intermolecular_edges(&self) -> impl Iterator<Item = &IntermolecularEdge> + '_ {
        self.intermolecular.values()
    }

    pub fn connections(&self, structure: StructureId) -> Option<&ConnectionIndex> {
        self.connections.get(&structure)
    }

    /// Intermolecular edges with an annotation endpoint at `annotation`.
    pub fn annotation_links(&self, annotation: AnnotationId) -> BTreeSet<IntermolecularKey> {
        self.annotation_links.get(&annotation).cloned().unwrap_or_default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Global bounds. `None` for an empty scene.
    pub fn limits(&self) -> Option<Limits> {
        self.boundary.limits()
    }

    pub fn boundary(&self) -> &BoundaryTracker {
        &self.boundary
    }

    /// Committed position of a positioned element.
    pub fn position(&self, key: PositionKey) -> Option<DVec2> {
        match key {
            PositionKey::Atom(id) => self.atom(id).map(|a| a.coordinates),
            PositionKey::Annotation(id) => self.annotations.get(&id).map(|a| a.coordinates),
            PositionKey::ControlPoint(spline, cp) => self
                .hydrophobic_contacts
                .get(&spline)?
                .control_point(cp)
                .map(|c| c.coordinates),
            PositionKey::StructureOffset(id) => self.structures.get(&id).map(|s| s.movement_offset),
        }
    }

    /// Draw position of an intermolecular endpoint (ring endpoints resolve to
    /// the ring centroid).
    pub fn endpoint_position(&self, structure: Option<StructureId>, endpoint: Endpoint) -> Option<DVec2> {
        match endpoint {
            Endpoint::Atom(id) => self.atom(id).map(|a| a.display_coordinates()),
            Endpoint::Ring(ring) => self.structures.get(&structure?)?.ring_centroid(ring),
            Endpoint::Annotation(id) => self.annotations.get(&id).map(|a| a.coordinates),
        }
    }

    /// Every id owned by or indexed to `structure`.
    pub fn ids_for_structure(&self, structure: StructureId) -> Option<StructureIds> {
        let s = self.structures.get(&structure)?;
        let index = self.connections.get(&structure);
        Some(StructureIds {
            atoms: s.atoms().map(|a| a.id).collect(),
            edges: s.edges().map(|e| e.id).collect(),
            rings: s.rings().map(|r| r.id).collect(),
            ring_systems: s.ring_systems().map(|r| r.id).collect(),
            annotations: index.map(|i| i.annotations().clone()).unwrap_or_default(),
            hydrophobic_contacts: index.map(|i| i.hydrophobic_contacts().clone()).unwrap_or_default(),
            intermolecular: index.map(|i| i.intermolecular().clone()).unwrap_or_default(),
        })
    }

    /// Per-structure summaries. With `only_selected`, structures without a
    /// selected atom are skipped.
    pub fn additional_information(&self, only_selected: bool) -> Vec<StructureInfo> {
        let selected = self.selection.effective();
        self.structures
            .values()
            .filter_map(|s| {
                let selected_atoms = s.atoms().filter(|a| selected.contains(&a.id)).count();
                if only_selected && selected_atoms == 0 {
                    return None;
                }
                let index = self.connections.get(&s.id);
                let mut interactions = BTreeMap::new();
                for key in index.into_iter().flat_map(|i| i.intermolecular().iter()) {
                    *interactions.entry(key.kind).or_insert(0) += 1;
                }
                Some(StructureInfo {
                    id: s.id,
                    name: s.name.clone(),
                    kind: s.kind,
                    representation: s.representation,
                    atom_count: s.atom_count(),
                    edge_count: s.edge_count(),
                    ring_count: s.rings().count(),
                    selected_atoms,
                    annotations: index.map(|i| i.annotations().len()).unwrap_or(0),
                    hydrophobic_contacts: index.map(|i| i.hydrophobic_contacts().len()).unwrap_or(0),
                    interactions,
                })
            })
            .collect()
    }

    /// Largest id in use per entity kind, `None` where the kind is empty.
    pub fn max_ids(&self) -> IdWatermarks {
        let mut marks = IdWatermarks {
            structure: self.structures.keys().next_back().map(|id| id.value()),
            atom: self.atom_owner.keys().next_back().map(|id| id.value()),
            edge: self.edge_owner.keys().next_back().map(|id| id.value()),
            annotation: self.annotations.keys().next_back().map(|id| id.value()),
            hydrophobic: self.hydrophobic_contacts.keys().next_back().map(|id| id.value()),
            intermolecular: BTreeMap::new(),
        };
        for key in self.intermolecular.keys() {
            let slot = marks.intermolecular.entry(key.kind).or_insert(0);
            *slot = (*slot).max(key.id.value());
        }
        marks
    }

    pub(crate) fn snapshot(&self) -> SceneSnapshot<'_> {
        SceneSnapshot {
            structures: self.structures.values().collect(),
            annotations: self.annotations.values().collect(),
            hydrophobic_contacts: self.hydrophobic_contacts.values().collect(),
            intermolecular: self.intermolecular.values().collect(),
            connections: &self.connections,
            annotation_links: &self.annotation_links,
            selection: &self.selection.committed,
        }
    }

    // =========================================================================
    // Fragment insertion and removal
    // =========================================================================

    /// Check that `fragment` can be inserted: ids are free and every
    /// reference resolves within the scene or the fragment itself.
    pub fn check_insertable(&self, fragment: &SceneFragment) -> Result<()> {
        let mut new_structures: BTreeMap<StructureId, &Structure> = BTreeMap::new();
        let mut new_atoms = BTreeSet::new();
        let mut new_edges = BTreeSet::new();
        for s in &fragment.structures {
            if self.structures.contains_key(&s.id) || new_structures.insert(s.id, s).is_some() {
                return Err(SceneError::duplicate(EntityKind::Structure, s.id.value()));
            }
            if let Some(problem) = s.violations().into_iter().next() {
                return Err(SceneError::dangling(s.id, problem));
            }
            for atom in s.atoms() {
                if self.atom_owner.contains_key(&atom.id) || !new_atoms.insert(atom.id) {
                    return Err(SceneError::duplicate(EntityKind::Atom, atom.id.value()));
                }
            }
            for edge in s.edges() {
                if self.edge_owner.contains_key(&edge.id) || !new_edges.insert(edge.id) {
                    return Err(SceneError::duplicate(EntityKind::Edge, edge.id.value()));
                }
            }
        }
        let structure = |id: StructureId| new_structures.get(&id).copied().or_else(|| self.structures.get(&id));

        let mut new_annotations = BTreeSet::new();
        for ann in &fragment.annotations {
            if self.annotations.contains_key(&ann.id) || !new_annotations.insert(ann.id) {
                return Err(SceneError::duplicate(EntityKind::Annotation, ann.id.value()));
            }
            match ann.belongs_to {
                Some(sid) => {
                    let s = structure(sid).ok_or_else(|| SceneError::dangling(ann.id, sid))?;
                    if let Some(missing) = ann.atom_links.iter().find(|a| !s.contains_atom(**a)) {
                        return Err(SceneError::dangling(ann.id, missing));
                    }
                }
                None => {
                    if let Some(atom) = ann.atom_links.iter().next() {
                        return Err(SceneError::dangling(ann.id, format!("owning structure of {}", atom)));
                    }
                }
            }
        }
        let annotation_exists = |id: AnnotationId| new_annotations.contains(&id) || self.annotations.contains_key(&id);

        let mut new_splines = BTreeSet::new();
        for spline in &fragment.hydrophobic_contacts {
            if self.hydrophobic_contacts.contains_key(&spline.id) || !new_splines.insert(spline.id) {
                return Err(SceneError::duplicate(EntityKind::HydrophobicContact, spline.id.value()));
            }
            let s = structure(spline.belongs_to).ok_or_else(|| SceneError::dangling(spline.id, spline.belongs_to))?;
            let mut cp_ids = BTreeSet::new();
            for cp in &spline.control_points {
                if !cp_ids.insert(cp.id) {
                    return Err(SceneError::duplicate(EntityKind::ControlPoint, cp.id.value()));
                }
                if let Some(missing) = cp.atom_links.iter().find(|a| !s.contains_atom(**a)) {
                    return Err(SceneError::dangling(format!("{} of {}", cp.id, spline.id), missing));
                }
            }
        }

        let mut new_keys = BTreeSet::new();
        for edge in &fragment.intermolecular {
            let key = edge.key();
            if self.intermolecular.contains_key(&key) || !new_keys.insert(key) {
                return Err(SceneError::duplicate(EntityKind::Intermolecular(edge.kind), edge.id.value()));
            }
            for (sid, endpoint) in edge.endpoints() {
                let resolved = match endpoint {
                    Endpoint::Annotation(id) => annotation_exists(id),
                    Endpoint::Atom(atom) => sid.and_then(|s| structure(s)).is_some_and(|s| s.contains_atom(atom)),
                    Endpoint::Ring(ring) => sid.and_then(|s| structure(s)).is_some_and(|s| s.ring(ring).is_some()),
                };
                if !resolved {
                    let missing = match (sid, endpoint) {
                        (Some(s), Endpoint::Atom(a)) => format!("{} in {}", a, s),
                        (Some(s), Endpoint::Ring(r)) => format!("{} in {}", r, s),
                        (_, Endpoint::Annotation(a)) => a.to_string(),
                        (None, _) => "owning structure".to_string(),
                    };
                    return Err(SceneError::dangling(key, missing));
                }
            }
        }
        Ok(())
    }

    /// Insert every entity of `fragment`. Rejected as a whole if any check
    /// fails.
    pub fn insert_fragment(&mut self, fragment: &SceneFragment) -> Result<()> {
        self.check_insertable(fragment)?;

        for s in &fragment.structures {
            let mut s = s.clone();
            s.calc_boundaries();
            s.reset_boundary_changes();
            for atom in s.atoms() {
                self.atom_owner.insert(atom.id, s.id);
            }
            for edge in s.edges() {
                self.edge_owner.insert(edge.id, s.id);
            }
            if let Some(limits) = s.limits() {
                self.boundary.set_maxes_add(&limits);
            }
            self.connections.entry(s.id).or_default();
            self.structures.insert(s.id, s);
        }
        for ann in &fragment.annotations {
            if let Some(sid) = ann.belongs_to {
                self.connections.entry(sid).or_default().register_annotation(ann);
            }
            self.boundary.set_maxes_add(&ann.draw_limits());
            self.annotations.insert(ann.id, ann.clone());
        }
        for spline in &fragment.hydrophobic_contacts {
            self.connections
                .entry(spline.belongs_to)
                .or_default()
                .register_hydrophobic(spline);
            if let Some(limits) = spline.curve_limits(self.spline_samples, self.stroke_radius) {
                self.boundary.set_maxes_add(&limits);
            }
            self.hydrophobic_contacts.insert(spline.id, spline.clone());
        }
        for edge in &fragment.intermolecular {
            self.link_intermolecular(edge);
            self.intermolecular.insert(edge.key(), edge.clone());
        }
        self.boundary.reset_change_dirs();

        tracing::debug!(
            structures = fragment.structures.len(),
            annotations = fragment.annotations.len(),
            hydrophobic_contacts = fragment.hydrophobic_contacts.len(),
            intermolecular = fragment.intermolecular.len(),
            "Inserted scene fragment"
        );
        Ok(())
    }

    fn link_intermolecular(&mut self, edge: &IntermolecularEdge) {
        let key = edge.key();
        for (sid, endpoint) in edge.endpoints() {
            match (sid, endpoint) {
                (_, Endpoint::Annotation(id)) => {
                    self.annotation_links.entry(id).or_default().insert(key);
                }
                (Some(sid), _) => {
                    self.connections.entry(sid).or_default().register_intermolecular(key, endpoint);
                }
                (None, _) => {}
            }
        }
    }

    fn unlink_intermolecular(&mut self, edge: &IntermolecularEdge) {
        let key = edge.key();
        for (sid, endpoint) in edge.endpoints() {
            match (sid, endpoint) {
                (_, Endpoint::Annotation(id)) => {
                    if let Some(set) = self.annotation_links.get_mut(&id) {
                        set.remove(&key);
                        if set.is_empty() {
                            self.annotation_links.remove(&id);
                        }
                    }
                }
                (Some(sid), _) => {
                    if let Some(index) = self.connections.get_mut(&sid) {
                        index.unregister_intermolecular(key, endpoint);
                    }
                }
                (None, _) => {}
            }
        }
    }

    /// Check that removing `fragment` leaves no dangling reference: every
    /// id must exist and everything still depending on a removed entity
    /// must be part of the fragment.
    pub fn check_removable(&self, fragment: &SceneFragment) -> Result<()> {
        let structures: BTreeSet<StructureId> = fragment.structures.iter().map(|s| s.id).collect();
        let annotations: BTreeSet<AnnotationId> = fragment.annotations.iter().map(|a| a.id).collect();
        let splines: BTreeSet<HydrophobicId> = fragment.hydrophobic_contacts.iter().map(|h| h.id).collect();
        let keys: BTreeSet<IntermolecularKey> = fragment.intermolecular.iter().map(|e| e.key()).collect();

        let inconsistent = |msg: String| Err(SceneError::InconsistentRemoval(msg));

        if let Some(id) = structures.iter().find(|id| !self.structures.contains_key(id)) {
            return inconsistent(format!("{} does not exist", id));
        }
        if let Some(id) = annotations.iter().find(|id| !self.annotations.contains_key(id)) {
            return inconsistent(format!("{} does not exist", id));
        }
        if let Some(id) = splines.iter().find(|id| !self.hydrophobic_contacts.contains_key(id)) {
            return inconsistent(format!("{} does not exist", id));
        }
        if let Some(key) = keys.iter().find(|k| !self.intermolecular.contains_key(k)) {
            return inconsistent(format!("{} does not exist", key));
        }

        for sid in &structures {
            let Some(index) = self.connections.get(sid) else { continue };
            if let Some(a) = index.annotations().iter().find(|a| !annotations.contains(a)) {
                return inconsistent(format!("{} still attached to removed {}", a, sid));
            }
            if let Some(h) = index.hydrophobic_contacts().iter().find(|h| !splines.contains(h)) {
                return inconsistent(format!("{} still attached to removed {}", h, sid));
            }
            if let Some(k) = index.intermolecular().iter().find(|k| !keys.contains(k)) {
                return inconsistent(format!("{} still attached to removed {}", k, sid));
            }
        }
        for aid in &annotations {
            if let Some(k) = self.annotation_links.get(aid).and_then(|l| l.iter().find(|k| !keys.contains(k))) {
                return inconsistent(format!("{} still ends on removed {}", k, aid));
            }
        }
        Ok(())
    }

    /// Remove every entity named in `fragment` (matched by id).
    pub fn remove_fragment(&mut self, fragment: &SceneFragment) -> Result<()> {
        self.check_removable(fragment)?;

        for edge in &fragment.intermolecular {
            if let Some(stored) = self.intermolecular.remove(&edge.key()) {
                self.unlink_intermolecular(&stored);
            }
        }
        for spline in &fragment.hydrophobic_contacts {
            if let Some(stored) = self.hydrophobic_contacts.remove(&spline.id) {
                if let Some(index) = self.connections.get_mut(&stored.belongs_to) {
                    index.unregister_hydrophobic(&stored);
                }
            }
        }
        for ann in &fragment.annotations {
            if let Some(stored) = self.annotations.remove(&ann.id) {
                if let Some(index) = stored.belongs_to.and_then(|s| self.connections.get_mut(&s)) {
                    index.unregister_annotation(&stored);
                }
            }
        }
        for s in &fragment.structures {
            if let Some(stored) = self.structures.remove(&s.id) {
                let atoms: BTreeSet<AtomId> = stored.atoms().map(|a| a.id).collect();
                for atom in &atoms {
                    self.atom_owner.remove(atom);
                }
                for edge in stored.edges() {
                    self.edge_owner.remove(&edge.id);
                }
                self.connections.remove(&s.id);
                self.selection.forget(&atoms);
            }
        }
        self.calc_boundaries(&FixedLimits::default());
        self.boundary.reset_change_dirs();

        tracing::debug!(
            structures = fragment.structures.len(),
            annotations = fragment.annotations.len(),
            hydrophobic_contacts = fragment.hydrophobic_contacts.len(),
            intermolecular = fragment.intermolecular.len(),
            "Removed scene fragment"
        );
        Ok(())
    }

    // =========================================================================
    // Entity replacement
    // =========================================================================

    /// Replace a structure with a new version of itself (same id).
    ///
    /// Everything indexed against the structure must still resolve in the
    /// new version; new atom and bond ids must not be owned elsewhere.
    /// Returns the previous version.
    pub fn replace_structure(&mut self, structure: Structure) -> Result<Structure> {
        let id = structure.id;
        if !self.structures.contains_key(&id) {
            return Err(SceneError::UnknownStructure(id));
        }
        if let Some(problem) = structure.violations().into_iter().next() {
            return Err(SceneError::dangling(id, problem));
        }
        for atom in structure.atoms() {
            if self.atom_owner.get(&atom.id).is_some_and(|owner| *owner != id) {
                return Err(SceneError::duplicate(EntityKind::Atom, atom.id.value()));
            }
        }
        for edge in structure.edges() {
            if self.edge_owner.get(&edge.id).is_some_and(|owner| *owner != id) {
                return Err(SceneError::duplicate(EntityKind::Edge, edge.id.value()));
            }
        }
        if let Some(index) = self.connections.get(&id) {
            if let Some(atom) = index.linked_atoms().into_iter().find(|a| !structure.contains_atom(*a)) {
                return Err(SceneError::InconsistentRemoval(format!("{} is still referenced", atom)));
            }
            if let Some(ring) = index.linked_rings().into_iter().find(|r| structure.ring(*r).is_none()) {
                return Err(SceneError::InconsistentRemoval(format!("{} of {} is still referenced", ring, id)));
            }
        }

        let mut structure = structure;
        structure.calc_boundaries();
        structure.reset_boundary_changes();

        // Validated above; the structure is present.
        let Some(previous) = self.structures.insert(id, structure) else {
            return Err(SceneError::UnknownStructure(id));
        };
        for atom in previous.atoms() {
            self.atom_owner.remove(&atom.id);
        }
        for edge in previous.edges() {
            self.edge_owner.remove(&edge.id);
        }
        if let Some(current) = self.structures.get(&id) {
            for atom in current.atoms() {
                self.atom_owner.insert(atom.id, id);
            }
            for edge in current.edges() {
                self.edge_owner.insert(edge.id, id);
            }
            let dropped: BTreeSet<AtomId> = previous
                .atoms()
                .map(|a| a.id)
                .filter(|a| !current.contains_atom(*a))
                .collect();
            self.selection.forget(&dropped);
        }

        self.rescan_with(FixedLimits {
            structures: None,
            hydrophobic_contacts: self.spline_limits(),
            annotations: self.annotation_limits(),
        });
        tracing::debug!(structure = %id, "Replaced structure");
        Ok(previous)
    }

    /// Replace an annotation (same id), re-indexing its atom links.
    pub fn replace_annotation(&mut self, annotation: Annotation) -> Result<Annotation> {
        let Some(previous) = self.annotations.get(&annotation.id) else {
            return Err(SceneError::dangling("replacement", annotation.id));
        };
        if previous.belongs_to != annotation.belongs_to && self.annotation_links.contains_key(&annotation.id) {
            return Err(SceneError::InconsistentRemoval(format!(
                "{} cannot change owner while linked",
                annotation.id
            )));
        }
        if let Some(sid) = annotation.belongs_to {
            let s = self
                .structures
                .get(&sid)
                .ok_or_else(|| SceneError::dangling(annotation.id, sid))?;
            if let Some(missing) = annotation.atom_links.iter().find(|a| !s.contains_atom(**a)) {
                return Err(SceneError::dangling(annotation.id, missing));
            }
        }

        let id = annotation.id;
        let Some(previous) = self.annotations.insert(id, annotation) else {
            return Err(SceneError::dangling("replacement", id));
        };
        if let Some(index) = previous.belongs_to.and_then(|s| self.connections.get_mut(&s)) {
            index.unregister_annotation(&previous);
        }
        if let Some(current) = self.annotations.get(&id) {
            if let Some(sid) = current.belongs_to {
                self.connections.entry(sid).or_default().register_annotation(current);
            }
        }
        self.rescan_with(FixedLimits {
            structures: self.structure_limits(),
            hydrophobic_contacts: self.spline_limits(),
            annotations: None,
        });
        Ok(previous)
    }

    /// Replace a hydrophobic contact (same id), re-indexing its control
    /// point links.
    pub fn replace_hydrophobic(&mut self, contact: HydrophobicContact) -> Result<HydrophobicContact> {
        if !self.hydrophobic_contacts.contains_key(&contact.id) {
            return Err(SceneError::dangling("replacement", contact.id));
        }
        let s = self
            .structures
            .get(&contact.belongs_to)
            .ok_or_else(|| SceneError::dangling(contact.id, contact.belongs_to))?;
        for cp in &contact.control_points {
            if let Some(missing) = cp.atom_links.iter().find(|a| !s.contains_atom(**a)) {
                return Err(SceneError::dangling(format!("{} of {}", cp.id, contact.id), missing));
            }
        }

        let id = contact.id;
        let Some(previous) = self.hydrophobic_contacts.insert(id, contact) else {
            return Err(SceneError::dangling("replacement", id));
        };
        if let Some(index) = self.connections.get_mut(&previous.belongs_to) {
            index.unregister_hydrophobic(&previous);
        }
        if let Some(current) = self.hydrophobic_contacts.get(&id) {
            self.connections
                .entry(current.belongs_to)
                .or_default()
                .register_hydrophobic(current);
        }
        self.rescan_with(FixedLimits {
            structures: self.structure_limits(),
            hydrophobic_contacts: None,
            annotations: self.annotation_limits(),
        });
        Ok(previous)
    }

    /// Switch a structure's representation. Returns the previous one.
    pub fn set_representation(&mut self, structure: StructureId, representation: Representation) -> Result<Representation> {
        let s = self
            .structures
            .get_mut(&structure)
            .ok_or(SceneError::UnknownStructure(structure))?;
        Ok(std::mem::replace(&mut s.representation, representation))
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    fn check_positions<'a, I: IntoIterator<Item = &'a PositionKey>>(&self, keys: I) -> Result<()> {
        for key in keys {
            if self.position(*key).is_none() {
                return Err(match key {
                    PositionKey::Atom(id) => SceneError::UnknownAtom(*id),
                    PositionKey::StructureOffset(id) => SceneError::UnknownStructure(*id),
                    PositionKey::Annotation(id) => SceneError::dangling("position update", id),
                    PositionKey::ControlPoint(spline, cp) => {
                        SceneError::dangling("position update", format!("{} of {}", cp, spline))
                    }
                });
            }
        }
        Ok(())
    }

    /// Set committed positions.
    ///
    /// Bounds are updated incrementally per element; regions whose extremal
    /// element moved inward are rescanned and returned. Orientation of atoms
    /// in touched structures is recomputed.
    pub fn set_positions(&mut self, positions: &BTreeMap<PositionKey, DVec2>) -> Result<Vec<BoundsRegion>> {
        self.check_positions(positions.keys())?;

        let mut touched_structures = BTreeSet::new();
        let mut touched_splines = BTreeSet::new();
        let mut annotations_moved = false;

        for (key, to) in positions {
            match *key {
                PositionKey::Atom(id) => {
                    let Some(sid) = self.atom_owner.get(&id).copied() else { continue };
                    let Some(s) = self.structures.get_mut(&sid) else { continue };
                    if let Some(from) = s.move_atom(id, *to) {
                        self.boundary
                            .set_maxes(&Limits::from_point(from), &Limits::from_point(*to));
                        touched_structures.insert(sid);
                    }
                }
                PositionKey::Annotation(id) => {
                    let Some(ann) = self.annotations.get_mut(&id) else { continue };
                    let old = ann.draw_limits();
                    ann.coordinates = *to;
                    self.boundary.set_maxes(&old, &ann.draw_limits());
                    annotations_moved = true;
                }
                PositionKey::ControlPoint(spline, cp) => {
                    let (samples, radius) = (self.spline_samples, self.stroke_radius);
                    let Some(contact) = self.hydrophobic_contacts.get_mut(&spline) else { continue };
                    let old = contact.curve_limits(samples, radius);
                    if let Some(point) = contact.control_point_mut(cp) {
                        point.coordinates = *to;
                    }
                    if let (Some(old), Some(new)) = (old, contact.curve_limits(samples, radius)) {
                        self.boundary.set_maxes(&old, &new);
                    }
                    touched_splines.insert(spline);
                }
                PositionKey::StructureOffset(id) => {
                    if let Some(s) = self.structures.get_mut(&id) {
                        s.movement_offset = *to;
                    }
                }
            }
        }

        let mut rescanned = Vec::new();
        for sid in &touched_structures {
            if let Some(s) = self.structures.get_mut(sid) {
                if s.boundary().needs_rescan() {
                    tracing::trace!(structure = %sid, "Structure bounds stale, rescanning");
                    s.calc_boundaries();
                    rescanned.push(BoundsRegion::Structure(*sid));
                }
                s.reset_boundary_changes();
                s.post_process_atoms();
            }
        }

        if self.boundary.needs_rescan() {
            tracing::trace!(stale = ?self.boundary.stale_axes(), "Scene bounds stale, rescanning");
            let fixed = FixedLimits {
                structures: if touched_structures.is_empty() { self.structure_limits() } else { None },
                hydrophobic_contacts: if touched_splines.is_empty() { self.spline_limits() } else { None },
                annotations: if annotations_moved { None } else { self.annotation_limits() },
            };
            self.calc_boundaries(&fixed);
            rescanned.push(BoundsRegion::Scene);
        }
        self.boundary.reset_change_dirs();
        self.rescans.extend(rescanned.iter().copied());
        Ok(rescanned)
    }

    /// Drain the regions rescanned since the last call.
    pub fn take_rescans(&mut self) -> Vec<BoundsRegion> {
        std::mem::take(&mut self.rescans)
    }

    /// Set in-progress positions; committed state and bounds are untouched.
    pub fn set_temp_positions(&mut self, positions: &BTreeMap<PositionKey, DVec2>) -> Result<()> {
        self.check_positions(positions.keys())?;
        for (key, to) in positions {
            match *key {
                PositionKey::Atom(id) => {
                    let sid = self.atom_owner.get(&id).copied();
                    if let Some(atom) = sid.and_then(|s| self.structures.get_mut(&s)).and_then(|s| s.atom_mut(id)) {
                        atom.temp_coordinates = Some(*to);
                    }
                }
                PositionKey::Annotation(id) => {
                    if let Some(ann) = self.annotations.get_mut(&id) {
                        ann.temp_coordinates = Some(*to);
                    }
                }
                PositionKey::ControlPoint(spline, cp) => {
                    if let Some(point) = self
                        .hydrophobic_contacts
                        .get_mut(&spline)
                        .and_then(|h| h.control_point_mut(cp))
                    {
                        point.temp_coordinates = Some(*to);
                    }
                }
                PositionKey::StructureOffset(_) => {}
            }
        }
        Ok(())
    }

    /// Drop every in-progress position.
    pub fn clear_temp_positions(&mut self) {
        for s in self.structures.values_mut() {
            let ids: Vec<AtomId> = s.atom_ids();
            for id in ids {
                if let Some(atom) = s.atom_mut(id) {
                    atom.temp_coordinates = None;
                }
            }
        }
        for ann in self.annotations.values_mut() {
            ann.temp_coordinates = None;
        }
        for contact in self.hydrophobic_contacts.values_mut() {
            for cp in &mut contact.control_points {
                cp.temp_coordinates = None;
            }
        }
    }

    fn structure_limits(&self) -> Option<Limits> {
        self.structures
            .values()
            .filter_map(|s| s.limits())
            .reduce(|a, b| a.union(&b))
    }

    fn spline_limits(&self) -> Option<Limits> {
        self.hydrophobic_contacts
            .values()
            .filter_map(|h| h.curve_limits(self.spline_samples, self.stroke_radius))
            .reduce(|a, b| a.union(&b))
    }

    fn annotation_limits(&self) -> Option<Limits> {
        self.annotations
            .values()
            .map(|a| a.draw_limits())
            .reduce(|a, b| a.union(&b))
    }

    /// Full rescan of the scene bounds. Kinds with a value in `fixed` are
    /// taken as given.
    pub fn calc_boundaries(&mut self, fixed: &FixedLimits) {
        let parts = [
            fixed.structures.or_else(|| self.structure_limits()),
            fixed.hydrophobic_contacts.or_else(|| self.spline_limits()),
            fixed.annotations.or_else(|| self.annotation_limits()),
        ];
        self.boundary.calc_boundaries(parts.into_iter().flatten());
    }

    fn rescan_with(&mut self, fixed: FixedLimits) {
        self.calc_boundaries(&fixed);
        self.boundary.reset_change_dirs();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn check_atoms(&self, atoms: &BTreeSet<AtomId>) -> Result<()> {
        match atoms.iter().find(|a| !self.atom_owner.contains_key(a)) {
            Some(missing) => Err(SceneError::UnknownAtom(*missing)),
            None => Ok(()),
        }
    }

    /// Select atoms, committed or temporary.
    pub fn select_atoms(&mut self, atoms: &BTreeSet<AtomId>, temporary: bool) -> Result<()> {
        self.check_atoms(atoms)?;
        for atom in atoms {
            self.selection.select(*atom, temporary);
        }
        Ok(())
    }

    /// Unselect atoms, committed or temporary.
    pub fn unselect_atoms(&mut self, atoms: &BTreeSet<AtomId>, temporary: bool) -> Result<()> {
        self.check_atoms(atoms)?;
        for atom in atoms {
            self.selection.unselect(*atom, temporary);
        }
        Ok(())
    }

    /// Drop temporary selection changes.
    pub fn discard_temporary_selection(&mut self) {
        self.selection.temp_added.clear();
        self.selection.temp_removed.clear();
    }

    /// Replace the committed selection and clear temporary changes.
    /// Ids are not checked: history restores selections across removals.
    pub fn set_committed_selection(&mut self, atoms: BTreeSet<AtomId>) {
        self.selection = Selection {
            committed: atoms,
            ..Selection::default()
        };
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Every invariant violation currently present. Empty when consistent.
    pub fn validate(&self) -> Vec<String> {
        let mut out = Vec::new();

        let mut atom_owner = BTreeMap::new();
        let mut edge_owner = BTreeMap::new();
        for s in self.structures.values() {
            out.extend(s.violations());
            for atom in s.atoms() {
                if atom_owner.insert(atom.id, s.id).is_some() {
                    out.push(format!("{} owned by several structures", atom.id));
                }
            }
            for edge in s.edges() {
                if edge_owner.insert(edge.id, s.id).is_some() {
                    out.push(format!("{} owned by several structures", edge.id));
                }
            }
        }
        if atom_owner != self.atom_owner {
            out.push("atom owner map out of date".to_string());
        }
        if edge_owner != self.edge_owner {
            out.push("bond owner map out of date".to_string());
        }

        let mut connections: BTreeMap<StructureId, ConnectionIndex> =
            self.structures.keys().map(|id| (*id, ConnectionIndex::new())).collect();
        let mut annotation_links: BTreeMap<AnnotationId, BTreeSet<IntermolecularKey>> = BTreeMap::new();

        for ann in self.annotations.values() {
            match ann.belongs_to.and_then(|s| self.structures.get(&s).map(|st| (s, st))) {
                Some((sid, s)) => {
                    for atom in ann.atom_links.iter().filter(|a| !s.contains_atom(**a)) {
                        out.push(format!("{} links missing {}", ann.id, atom));
                    }
                    connections.entry(sid).or_default().register_annotation(ann);
                }
                None if ann.belongs_to.is_some() => out.push(format!("{} belongs to a missing structure", ann.id)),
                None => {}
            }
        }
        for spline in self.hydrophobic_contacts.values() {
            match self.structures.get(&spline.belongs_to) {
                Some(s) => {
                    for atom in spline.linked_atoms().iter().filter(|a| !s.contains_atom(**a)) {
                        out.push(format!("{} links missing {}", spline.id, atom));
                    }
                }
                None => out.push(format!("{} belongs to a missing structure", spline.id)),
            }
            connections.entry(spline.belongs_to).or_default().register_hydrophobic(spline);
        }
        for edge in self.intermolecular.values() {
            let key = edge.key();
            for (sid, endpoint) in edge.endpoints() {
                let resolved = match endpoint {
                    Endpoint::Annotation(id) => {
                        annotation_links.entry(id).or_default().insert(key);
                        self.annotations.contains_key(&id)
                    }
                    Endpoint::Atom(atom) => {
                        if let Some(sid) = sid {
                            connections.entry(sid).or_default().register_intermolecular(key, endpoint);
                        }
                        sid.and_then(|s| self.structures.get(&s)).is_some_and(|s| s.contains_atom(atom))
                    }
                    Endpoint::Ring(ring) => {
                        if let Some(sid) = sid {
                            connections.entry(sid).or_default().register_intermolecular(key, endpoint);
                        }
                        sid.and_then(|s| self.structures.get(&s)).is_some_and(|s| s.ring(ring).is_some())
                    }
                };
                if !resolved {
                    out.push(format!("{} has a dangling endpoint {:?}", key, endpoint));
                }
            }
        }
        if connections != self.connections {
            out.push("connection index out of date".to_string());
        }
        if annotation_links != self.annotation_links {
            out.push("annotation link table out of date".to_string());
        }

        for atom in self.selection.effective() {
            if !self.atom_owner.contains_key(&atom) {
                out.push(format!("selection holds missing {}", atom));
            }
        }

        if !self.boundary.needs_rescan() {
            let expected = [self.structure_limits(), self.spline_limits(), self.annotation_limits()]
                .into_iter()
                .flatten()
                .reduce(|a, b| a.union(&b));
            if expected != self.limits() {
                out.push(format!("scene bounds {:?} differ from {:?}", self.limits(), expected));
            }
        }
        out
    }
}

/// Largest id in use per kind; see [`Scene::max_ids`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdWatermarks {
    pub structure: Option<u32>,
    pub atom: Option<u32>,
    pub edge: Option<u32>,
    pub annotation: Option<u32>,
    pub hydrophobic: Option<u32>,
    pub intermolecular: BTreeMap<IntermolecularKind, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::structure::tests::{a, toluene};
    use crate::types::{ControlPoint, IntermolecularId};

    fn scene_with_two() -> Scene {
        let mut scene = Scene::new();
        let mut second = Structure::new(StructureId::new(2), "HOH", StructureKind::Water);
        second.add_atom(Atom::new(a(20), "O", DVec2::new(60.0, 0.0))).unwrap();
        second.calc_boundaries();
        let fragment = SceneFragment {
            structures: vec![toluene(1), second],
            annotations: vec![Annotation::new(AnnotationId::new(1), "TOL", DVec2::new(0.0, 30.0), DVec2::new(8.0, 4.0))
                .attached(StructureId::new(1), [a(7)])],
            hydrophobic_contacts: vec![HydrophobicContact::new(
                HydrophobicId::new(1),
                StructureId::new(1),
                vec![
                    ControlPoint::new(ControlPointId::new(0), DVec2::new(-12.0, 0.0)).linked([a(4)]),
                    ControlPoint::new(ControlPointId::new(1), DVec2::new(0.0, -12.0)),
                ],
            )],
            intermolecular: vec![IntermolecularEdge::new(
                IntermolecularId::new(0),
                IntermolecularKind::AtomPair,
                (StructureId::new(1), Endpoint::Atom(a(7))),
                (StructureId::new(2), Endpoint::Atom(a(20))),
            )],
        };
        scene.insert_fragment(&fragment).unwrap();
        scene
    }

    #[test]
    fn test_insert_builds_indices() {
        let scene = scene_with_two();
        assert!(scene.validate().is_empty(), "{:?}", scene.validate());
        assert_eq!(scene.structure_of_atom(a(20)), Some(StructureId::new(2)));
        let ids = scene.ids_for_structure(StructureId::new(1)).unwrap();
        assert_eq!(ids.atoms.len(), 7);
        assert_eq!(ids.annotations.len(), 1);
        assert_eq!(ids.hydrophobic_contacts.len(), 1);
        assert_eq!(ids.intermolecular.len(), 1);
        assert_eq!(scene.limits().unwrap().max.x, 60.0);
    }

    #[test]
    fn test_duplicate_and_dangling_rejected_without_mutation() {
        let mut scene = scene_with_two();
        let before = scene.max_ids();
        let mut clash = Structure::new(StructureId::new(3), "X", StructureKind::Other);
        clash.add_atom(Atom::new(a(20), "C", DVec2::ZERO)).unwrap();
        let err = scene
            .insert_fragment(&SceneFragment {
                structures: vec![clash],
                ..SceneFragment::default()
            })
            .unwrap_err();
        assert_eq!(err, SceneError::duplicate(EntityKind::Atom, 20));

        let dangling = IntermolecularEdge::new(
            IntermolecularId::new(1),
            IntermolecularKind::PiStacking,
            (StructureId::new(1), Endpoint::Ring(RingId::new(9))),
            (StructureId::new(2), Endpoint::Atom(a(20))),
        );
        let err = scene
            .insert_fragment(&SceneFragment {
                intermolecular: vec![dangling],
                ..SceneFragment::default()
            })
            .unwrap_err();
        assert!(matches!(err, SceneError::ReferentialIntegrity { .. }));
        assert_eq!(scene.max_ids(), before);
        assert!(scene.validate().is_empty());
    }

    #[test]
    fn test_removal_requires_closure() {
        let mut scene = scene_with_two();
        let water = scene.structure(StructureId::new(2)).unwrap().clone();
        let err = scene
            .remove_fragment(&SceneFragment {
                structures: vec![water.clone()],
                ..SceneFragment::default()
            })
            .unwrap_err();
        assert!(matches!(err, SceneError::InconsistentRemoval(_)));

        let pair = scene.intermolecular_edges().next().unwrap().clone();
        scene
            .remove_fragment(&SceneFragment {
                structures: vec![water],
                intermolecular: vec![pair],
                ..SceneFragment::default()
            })
            .unwrap();
        assert!(scene.validate().is_empty());
        assert_eq!(scene.limits().unwrap().max.x, 20.0);
    }

    #[test]
    fn test_positions_update_bounds_incrementally() {
        let mut scene = scene_with_two();
        let moves: BTreeMap<PositionKey, DVec2> = [(PositionKey::Atom(a(20)), DVec2::new(80.0, 0.0))].into();
        let rescans = scene.set_positions(&moves).unwrap();
        // The lone water atom was its own extremum on every axis.
        assert_eq!(rescans, vec![BoundsRegion::Structure(StructureId::new(2))]);
        assert_eq!(scene.limits().unwrap().max.x, 80.0);

        let moves: BTreeMap<PositionKey, DVec2> = [(PositionKey::Atom(a(20)), DVec2::new(30.0, 0.0))].into();
        let rescans = scene.set_positions(&moves).unwrap();
        assert!(rescans.contains(&BoundsRegion::Scene));
        assert_eq!(scene.limits().unwrap().max.x, 30.0);
        assert!(scene.validate().is_empty());
    }

    #[test]
    fn test_unknown_position_rejected() {
        let mut scene = scene_with_two();
        let moves: BTreeMap<PositionKey, DVec2> = [
            (PositionKey::Atom(a(20)), DVec2::new(80.0, 0.0)),
            (PositionKey::Atom(a(99)), DVec2::ZERO),
        ]
        .into();
        assert_eq!(scene.set_positions(&moves).unwrap_err(), SceneError::UnknownAtom(a(99)));
        assert_eq!(scene.atom(a(20)).unwrap().coordinates, DVec2::new(60.0, 0.0));
    }

    #[test]
    fn test_temporary_selection() {
        let mut scene = scene_with_two();
        let one: BTreeSet<AtomId> = [a(1)].into();
        let two: BTreeSet<AtomId> = [a(2)].into();
        scene.select_atoms(&one, false).unwrap();
        scene.select_atoms(&two, true).unwrap();
        scene.unselect_atoms(&one, true).unwrap();
        assert_eq!(scene.selection().effective(), two);
        assert_eq!(scene.selection().committed(), &one);
        scene.discard_temporary_selection();
        assert_eq!(scene.selection().effective(), one);
        assert_eq!(scene.additional_information(true).len(), 1);
    }
}
