//! Affected-element resolution.
//!
//! Given the atoms an edit touches, find every dependent entity that must
//! be updated with them, through the connection indices only:
//!
//! ```text
//! atoms ──► ring systems ──► rings ──► ring-indexed intermolecular edges
//!   │
//!   ├──► atom-indexed intermolecular edges
//!   ├──► linked annotations ──► annotation-ended intermolecular edges
//!   └──► linked spline control points
//! ```
//!
//! Removal uses the same indices to compute the full transitive closure of
//! a request before anything is deleted.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SceneError};
use crate::store::{AtomGraph, Scene};
use crate::types::{
    AnnotationId, AtomId, ControlPointId, EdgeId, HydrophobicId, IntermolecularId, IntermolecularKey,
    IntermolecularKind, RingId, StructureId,
};

/// How far a move reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveGranularity {
    /// Only the given atoms move.
    #[default]
    Atoms,
    /// The whole structure of every given atom moves.
    Structure,
}

/// Everything that must be updated alongside a move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AffectedSet {
    /// Structures with moving atoms.
    pub structures: BTreeSet<StructureId>,
    /// Moving atoms (all atoms of each structure for whole-structure moves).
    pub atoms: BTreeSet<AtomId>,
    /// Intermolecular edges to redraw.
    pub intermolecular: BTreeSet<IntermolecularKey>,
    /// Annotations that move along.
    pub annotations: BTreeSet<AnnotationId>,
    /// Spline control points that move along.
    pub control_points: BTreeMap<HydrophobicId, BTreeSet<ControlPointId>>,
}

/// Entities a caller asks to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalRequest {
    pub structures: BTreeSet<StructureId>,
    pub atoms: BTreeSet<AtomId>,
    pub annotations: BTreeSet<AnnotationId>,
    pub hydrophobic_contacts: BTreeSet<HydrophobicId>,
    pub intermolecular: BTreeSet<IntermolecularKey>,
}

impl RemovalRequest {
    pub fn structures(ids: impl IntoIterator<Item = StructureId>) -> Self {
        Self {
            structures: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn atoms(ids: impl IntoIterator<Item = AtomId>) -> Self {
        Self {
            atoms: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
            && self.atoms.is_empty()
            && self.annotations.is_empty()
            && self.hydrophobic_contacts.is_empty()
            && self.intermolecular.is_empty()
    }
}

/// Full transitive closure of a removal request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalSet {
    /// Structures removed whole.
    pub structures: BTreeSet<StructureId>,
    /// Every removed atom, including those of removed structures.
    pub atoms: BTreeSet<AtomId>,
    /// Every removed bond.
    pub edges: BTreeSet<EdgeId>,
    /// Rings removed from surviving structures.
    pub rings: BTreeMap<StructureId, BTreeSet<RingId>>,
    pub annotations: BTreeSet<AnnotationId>,
    pub atom_pair_interactions: BTreeSet<IntermolecularId>,
    pub pi_stackings: BTreeSet<IntermolecularId>,
    pub cation_pi_stackings: BTreeSet<IntermolecularId>,
    pub distances: BTreeSet<IntermolecularId>,
    pub interactions: BTreeSet<IntermolecularId>,
    pub hydrophobic_contacts: BTreeSet<HydrophobicId>,
    /// Atoms removed from structures that survive.
    pub partial: BTreeMap<StructureId, BTreeSet<AtomId>>,
    /// Surviving annotations losing atom links.
    pub annotation_unlinks: BTreeMap<AnnotationId, BTreeSet<AtomId>>,
    /// Surviving splines losing control point links.
    pub control_point_unlinks: BTreeMap<HydrophobicId, BTreeSet<ControlPointId>>,
}

impl RemovalSet {
    /// Removed ids of one intermolecular kind.
    pub fn intermolecular_ids(&self, kind: IntermolecularKind) -> &BTreeSet<IntermolecularId> {
        match kind {
            IntermolecularKind::AtomPair => &self.atom_pair_interactions,
            IntermolecularKind::PiStacking => &self.pi_stackings,
            IntermolecularKind::CationPiStacking => &self.cation_pi_stackings,
            IntermolecularKind::Distance => &self.distances,
            IntermolecularKind::Interaction => &self.interactions,
        }
    }

    fn intermolecular_ids_mut(&mut self, kind: IntermolecularKind) -> &mut BTreeSet<IntermolecularId> {
        match kind {
            IntermolecularKind::AtomPair => &mut self.atom_pair_interactions,
            IntermolecularKind::PiStacking => &mut self.pi_stackings,
            IntermolecularKind::CationPiStacking => &mut self.cation_pi_stackings,
            IntermolecularKind::Distance => &mut self.distances,
            IntermolecularKind::Interaction => &mut self.interactions,
        }
    }

    /// Every removed intermolecular edge as a scene-wide key.
    pub fn intermolecular_keys(&self) -> BTreeSet<IntermolecularKey> {
        IntermolecularKind::ALL
            .iter()
            .flat_map(|kind| {
                self.intermolecular_ids(*kind)
                    .iter()
                    .map(move |id| IntermolecularKey::new(*kind, *id))
            })
            .collect()
    }

    fn insert_key(&mut self, key: IntermolecularKey) {
        self.intermolecular_ids_mut(key.kind).insert(key.id);
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
            && self.atoms.is_empty()
            && self.annotations.is_empty()
            && self.hydrophobic_contacts.is_empty()
            && self.intermolecular_keys().is_empty()
    }
}

/// Read-only resolver over a scene.
pub struct AffectedResolver<'a> {
    scene: &'a Scene,
}

impl<'a> AffectedResolver<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Group atoms by owning structure; unknown atoms are skipped.
    fn by_structure(&self, atoms: &BTreeSet<AtomId>) -> BTreeMap<StructureId, BTreeSet<AtomId>> {
        let mut groups: BTreeMap<StructureId, BTreeSet<AtomId>> = BTreeMap::new();
        for atom in atoms {
            if let Some(sid) = self.scene.structure_of_atom(*atom) {
                groups.entry(sid).or_default().insert(*atom);
            }
        }
        groups
    }

    /// Rings in every ring system that contains one of `atoms`.
    fn rings_in_systems(&self, structure: StructureId, atoms: &BTreeSet<AtomId>) -> BTreeSet<RingId> {
        self.scene
            .structure(structure)
            .map(|s| s.rings_of_systems(&s.ring_systems_of_atoms(atoms)))
            .unwrap_or_default()
    }

    /// Intermolecular edges of `kind` affected when `atoms` move: edges
    /// indexed on the atoms plus edges on rings of the atoms' ring systems.
    pub fn intermolecular_affected_by_atoms(
        &self,
        atoms: &BTreeSet<AtomId>,
        kind: IntermolecularKind,
    ) -> BTreeSet<IntermolecularKey> {
        let mut out = BTreeSet::new();
        for (sid, group) in self.by_structure(atoms) {
            let Some(index) = self.scene.connections(sid) else { continue };
            out.extend(index.intermolecular_of_atoms(&group, kind));
            out.extend(index.intermolecular_of_rings(&self.rings_in_systems(sid, &group), kind));
        }
        out
    }

    /// Atom-pair interactions affected by moving `atoms`.
    pub fn atom_pair_interactions(
        &self,
        atoms: &BTreeSet<AtomId>,
        granularity: MoveGranularity,
    ) -> BTreeSet<IntermolecularId> {
        let kind = IntermolecularKind::AtomPair;
        match granularity {
            MoveGranularity::Structure => self
                .by_structure(atoms)
                .keys()
                .filter_map(|sid| self.scene.connections(*sid))
                .flat_map(|index| index.intermolecular_of_kind(kind))
                .map(|k| k.id)
                .collect(),
            MoveGranularity::Atoms => self
                .by_structure(atoms)
                .into_iter()
                .filter_map(|(sid, group)| self.scene.connections(sid).map(|i| i.intermolecular_of_atoms(&group, kind)))
                .flatten()
                .map(|k| k.id)
                .collect(),
        }
    }

    /// Pi-stackings on rings of the ring systems containing `atoms`.
    pub fn pi_stackings_affected_by_atoms(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<IntermolecularId> {
        let kind = IntermolecularKind::PiStacking;
        let mut out = BTreeSet::new();
        for (sid, group) in self.by_structure(atoms) {
            let Some(index) = self.scene.connections(sid) else { continue };
            let rings = self.rings_in_systems(sid, &group);
            out.extend(index.intermolecular_of_rings(&rings, kind).into_iter().map(|k| k.id));
        }
        out
    }

    /// Cation-pi stackings: ring-system path plus edges on the atoms
    /// themselves.
    pub fn cation_pi_stackings_affected_by_atoms(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<IntermolecularId> {
        self.intermolecular_affected_by_atoms(atoms, IntermolecularKind::CationPiStacking)
            .into_iter()
            .map(|k| k.id)
            .collect()
    }

    /// Annotations linked to any of `atoms`.
    pub fn annotations_affected_by_atoms(&self, atoms: &BTreeSet<AtomId>) -> BTreeSet<AnnotationId> {
        self.by_structure(atoms)
            .into_iter()
            .filter_map(|(sid, group)| self.scene.connections(sid).map(|i| i.annotations_of_atoms(&group)))
            .flatten()
            .collect()
    }

    /// Spline control points linked to any of `atoms`.
    pub fn control_points_affected_by_atoms(
        &self,
        atoms: &BTreeSet<AtomId>,
    ) -> BTreeMap<HydrophobicId, BTreeSet<ControlPointId>> {
        let mut out: BTreeMap<HydrophobicId, BTreeSet<ControlPointId>> = BTreeMap::new();
        for (sid, group) in self.by_structure(atoms) {
            let Some(index) = self.scene.connections(sid) else { continue };
            for (spline, points) in index.control_points_of_atoms(&group) {
                out.entry(spline).or_default().extend(points);
            }
        }
        out
    }

    /// Everything that follows a move of `atoms`.
    ///
    /// Annotations follow a whole-structure move unconditionally and an
    /// atom move only when all of their linked atoms move.
    pub fn affected_by_move(&self, atoms: &BTreeSet<AtomId>, granularity: MoveGranularity) -> AffectedSet {
        let groups = self.by_structure(atoms);
        let structures: BTreeSet<StructureId> = groups.keys().copied().collect();
        let moving: BTreeSet<AtomId> = match granularity {
            MoveGranularity::Atoms => groups.values().flatten().copied().collect(),
            MoveGranularity::Structure => structures
                .iter()
                .filter_map(|sid| self.scene.structure(*sid))
                .flat_map(|s| s.atom_ids())
                .collect(),
        };

        let annotations: BTreeSet<AnnotationId> = match granularity {
            MoveGranularity::Structure => structures
                .iter()
                .filter_map(|sid| self.scene.connections(*sid))
                .flat_map(|i| i.annotations().iter().copied())
                .collect(),
            MoveGranularity::Atoms => self
                .annotations_affected_by_atoms(&moving)
                .into_iter()
                .filter(|id| {
                    self.scene
                        .annotation(*id)
                        .is_some_and(|a| a.atom_links.is_subset(&moving))
                })
                .collect(),
        };

        let mut intermolecular = BTreeSet::new();
        for kind in IntermolecularKind::ALL {
            intermolecular.extend(self.intermolecular_affected_by_atoms(&moving, kind));
        }
        for ann in &annotations {
            intermolecular.extend(self.scene.annotation_links(*ann));
        }

        AffectedSet {
            structures,
            control_points: self.control_points_affected_by_atoms(&moving),
            atoms: moving,
            intermolecular,
            annotations,
        }
    }

    fn check_request(&self, request: &RemovalRequest) -> Result<()> {
        let missing = |what: String| Err(SceneError::InconsistentRemoval(format!("{} does not exist", what)));
        if let Some(id) = request.structures.iter().find(|id| self.scene.structure(**id).is_none()) {
            return missing(id.to_string());
        }
        if let Some(id) = request.atoms.iter().find(|id| self.scene.structure_of_atom(**id).is_none()) {
            return missing(id.to_string());
        }
        if let Some(id) = request.annotations.iter().find(|id| self.scene.annotation(**id).is_none()) {
            return missing(id.to_string());
        }
        if let Some(id) = request
            .hydrophobic_contacts
            .iter()
            .find(|id| self.scene.hydrophobic_contact(**id).is_none())
        {
            return missing(id.to_string());
        }
        if let Some(key) = request.intermolecular.iter().find(|k| self.scene.intermolecular(**k).is_none()) {
            return missing(key.to_string());
        }
        Ok(())
    }

    /// Compute the transitive closure of a removal request.
    ///
    /// - A structure takes its atoms, bonds and everything indexed to it.
    /// - Atoms covering their whole structure escalate to removing it.
    /// - A bare atom takes its bonds, the rings through it and the
    ///   intermolecular edges on either; annotation and control point links
    ///   to it are dropped but their owners survive.
    /// - An annotation takes the intermolecular edges ending on it.
    pub fn removal_closure(&self, request: &RemovalRequest) -> Result<RemovalSet> {
        self.check_request(request)?;
        let mut set = RemovalSet {
            structures: request.structures.clone(),
            annotations: request.annotations.clone(),
            hydrophobic_contacts: request.hydrophobic_contacts.clone(),
            ..RemovalSet::default()
        };
        for key in &request.intermolecular {
            set.insert_key(*key);
        }

        let mut partial = BTreeMap::new();
        for (sid, group) in self.by_structure(&request.atoms) {
            if set.structures.contains(&sid) {
                continue;
            }
            let covers_all = self.scene.structure(sid).is_some_and(|s| s.atom_count() == group.len());
            if covers_all {
                set.structures.insert(sid);
            } else {
                partial.insert(sid, group);
            }
        }

        for sid in &set.structures.clone() {
            let Some(s) = self.scene.structure(*sid) else { continue };
            set.atoms.extend(s.atoms().map(|a| a.id));
            set.edges.extend(s.edges().map(|e| e.id));
            if let Some(index) = self.scene.connections(*sid) {
                set.annotations.extend(index.annotations().iter().copied());
                set.hydrophobic_contacts.extend(index.hydrophobic_contacts().iter().copied());
                for key in index.intermolecular() {
                    set.insert_key(*key);
                }
            }
        }

        for (sid, atoms) in &partial {
            let Some(s) = self.scene.structure(*sid) else { continue };
            let rings = s.rings_touching(atoms);
            set.atoms.extend(atoms.iter().copied());
            set.edges.extend(s.incident_edges(atoms));
            if let Some(index) = self.scene.connections(*sid) {
                for kind in IntermolecularKind::ALL {
                    for key in index.intermolecular_of_atoms(atoms, kind) {
                        set.insert_key(key);
                    }
                    for key in index.intermolecular_of_rings(&rings, kind) {
                        set.insert_key(key);
                    }
                }
                for ann in index.annotations_of_atoms(atoms) {
                    if let Some(a) = self.scene.annotation(ann) {
                        let dropped: BTreeSet<AtomId> = a.atom_links.intersection(atoms).copied().collect();
                        set.annotation_unlinks.insert(ann, dropped);
                    }
                }
                for (spline, points) in index.control_points_of_atoms(atoms) {
                    set.control_point_unlinks.entry(spline).or_default().extend(points);
                }
            }
            if !rings.is_empty() {
                set.rings.insert(*sid, rings);
            }
        }
        set.partial = partial;

        for ann in &set.annotations.clone() {
            for key in self.scene.annotation_links(*ann) {
                set.insert_key(key);
            }
        }
        let removed_annotations = set.annotations.clone();
        set.annotation_unlinks.retain(|id, _| !removed_annotations.contains(id));
        let removed_splines = set.hydrophobic_contacts.clone();
        set.control_point_unlinks.retain(|id, _| !removed_splines.contains(id));

        tracing::debug!(
            structures = set.structures.len(),
            atoms = set.atoms.len(),
            annotations = set.annotations.len(),
            intermolecular = set.intermolecular_keys().len(),
            "Resolved removal closure"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::SceneFragment;
    use crate::store::structure::tests::{a, toluene};
    use crate::store::{Structure, StructureKind};
    use crate::types::{Annotation, Atom, ControlPoint, Endpoint, HydrophobicContact, IntermolecularEdge};
    use glam::DVec2;

    fn s(n: u32) -> StructureId {
        StructureId::new(n)
    }

    /// Toluene (structure 1) and a lysine stub (structure 2, atoms 30..=31)
    /// with one pi-stacking, one cation-pi and one atom-pair edge.
    fn scene() -> Scene {
        let mut lys = Structure::new(s(2), "LYS", StructureKind::Residue);
        lys.add_atom(Atom::new(a(30), "C", DVec2::new(40.0, 0.0))).unwrap();
        lys.add_atom(Atom::new(a(31), "N", DVec2::new(50.0, 0.0)).with_charge(1)).unwrap();
        lys.add_edge(crate::types::Edge::single(EdgeId::new(30), a(30), a(31))).unwrap();
        lys.calc_boundaries();

        let tol = toluene(1);
        let ring = tol.rings().next().unwrap().id;
        let mut scene = Scene::new();
        scene
            .insert_fragment(&SceneFragment {
                structures: vec![tol, lys],
                annotations: vec![
                    Annotation::new(AnnotationId::new(1), "TOL", DVec2::new(0.0, 20.0), DVec2::new(6.0, 3.0))
                        .attached(s(1), [a(7)]),
                    Annotation::new(AnnotationId::new(2), "LYS 12", DVec2::new(45.0, 10.0), DVec2::new(6.0, 3.0))
                        .attached(s(2), Vec::<AtomId>::new()),
                ],
                hydrophobic_contacts: vec![HydrophobicContact::new(
                    HydrophobicId::new(1),
                    s(1),
                    vec![
                        ControlPoint::new(ControlPointId::new(0), DVec2::new(-12.0, 0.0)).linked([a(4)]),
                        ControlPoint::new(ControlPointId::new(1), DVec2::new(0.0, -12.0)),
                    ],
                )],
                intermolecular: vec![
                    IntermolecularEdge::new(
                        IntermolecularId::new(0),
                        IntermolecularKind::CationPiStacking,
                        (s(1), Endpoint::Ring(ring)),
                        (s(2), Endpoint::Atom(a(31))),
                    ),
                    IntermolecularEdge::new(
                        IntermolecularId::new(0),
                        IntermolecularKind::AtomPair,
                        (s(1), Endpoint::Atom(a(7))),
                        (s(2), Endpoint::Atom(a(30))),
                    ),
                    IntermolecularEdge {
                        id: IntermolecularId::new(0),
                        kind: IntermolecularKind::Distance,
                        from: Endpoint::Annotation(AnnotationId::new(2)),
                        to: Endpoint::Atom(a(7)),
                        from_structure: None,
                        to_structure: Some(s(1)),
                    },
                ],
            })
            .unwrap();
        scene
    }

    fn ids(v: &[u32]) -> BTreeSet<IntermolecularId> {
        v.iter().map(|i| IntermolecularId::new(*i)).collect()
    }

    #[test]
    fn test_ring_system_resolution() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        // Atom 3 is on the ring but not an endpoint itself.
        let cation = r.cation_pi_stackings_affected_by_atoms(&[a(3)].into());
        assert_eq!(cation, ids(&[0]));
        // Atom 7 hangs off the ring, outside every ring system.
        assert!(r.cation_pi_stackings_affected_by_atoms(&[a(7)].into()).is_empty());
        // Cations also resolve through the atom index.
        assert_eq!(r.cation_pi_stackings_affected_by_atoms(&[a(31)].into()), ids(&[0]));
    }

    #[test]
    fn test_atom_pair_granularity() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        assert!(r.atom_pair_interactions(&[a(1)].into(), MoveGranularity::Atoms).is_empty());
        assert_eq!(r.atom_pair_interactions(&[a(1)].into(), MoveGranularity::Structure), ids(&[0]));
        assert_eq!(r.atom_pair_interactions(&[a(7)].into(), MoveGranularity::Atoms), ids(&[0]));
    }

    #[test]
    fn test_move_carries_links() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        let affected = r.affected_by_move(&[a(4), a(7)].into(), MoveGranularity::Atoms);
        assert_eq!(affected.annotations, [AnnotationId::new(1)].into());
        assert_eq!(
            affected.control_points[&HydrophobicId::new(1)],
            [ControlPointId::new(0)].into()
        );
        assert!(affected
            .intermolecular
            .contains(&IntermolecularKey::new(IntermolecularKind::Distance, IntermolecularId::new(0))));

        let whole = r.affected_by_move(&[a(30)].into(), MoveGranularity::Structure);
        assert_eq!(whole.atoms, [a(30), a(31)].into());
        assert_eq!(whole.annotations, [AnnotationId::new(2)].into());
    }

    #[test]
    fn test_partially_moved_annotation_stays() {
        let mut scene = scene();
        scene
            .insert_fragment(&SceneFragment {
                annotations: vec![Annotation::new(
                    AnnotationId::new(3),
                    "C1-C7",
                    DVec2::new(15.0, -10.0),
                    DVec2::new(6.0, 3.0),
                )
                .attached(s(1), [a(1), a(7)])],
                ..SceneFragment::default()
            })
            .unwrap();
        let r = AffectedResolver::new(&scene);

        let partial = r.affected_by_move(&[a(7)].into(), MoveGranularity::Atoms);
        assert_eq!(partial.annotations, [AnnotationId::new(1)].into());

        let both = r.affected_by_move(&[a(1), a(7)].into(), MoveGranularity::Atoms);
        assert_eq!(both.annotations, [AnnotationId::new(1), AnnotationId::new(3)].into());
    }

    #[test]
    fn test_bare_atom_removal_keeps_structure() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        let set = r.removal_closure(&RemovalRequest::atoms([a(7)])).unwrap();
        assert!(set.structures.is_empty());
        assert_eq!(set.atoms, [a(7)].into());
        assert_eq!(set.edges, [EdgeId::new(7)].into());
        assert_eq!(set.atom_pair_interactions, ids(&[0]));
        assert_eq!(set.distances, ids(&[0]));
        assert!(set.annotations.is_empty());
        assert_eq!(set.annotation_unlinks[&AnnotationId::new(1)], [a(7)].into());
    }

    #[test]
    fn test_ring_atom_removal_takes_ring_edges() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        let set = r.removal_closure(&RemovalRequest::atoms([a(4)])).unwrap();
        assert_eq!(set.cation_pi_stackings, ids(&[0]));
        assert_eq!(set.rings[&s(1)].len(), 1);
        assert_eq!(set.control_point_unlinks[&HydrophobicId::new(1)], [ControlPointId::new(0)].into());
    }

    #[test]
    fn test_structure_removal_closure() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        let set = r.removal_closure(&RemovalRequest::structures([s(2)])).unwrap();
        assert_eq!(set.structures, [s(2)].into());
        assert_eq!(set.atoms, [a(30), a(31)].into());
        assert_eq!(set.annotations, [AnnotationId::new(2)].into());
        // The distance edge ends on the removed annotation.
        assert_eq!(set.distances, ids(&[0]));
        assert_eq!(set.atom_pair_interactions, ids(&[0]));
        assert_eq!(set.cation_pi_stackings, ids(&[0]));
    }

    #[test]
    fn test_all_atoms_escalate_and_unknown_rejected() {
        let scene = scene();
        let r = AffectedResolver::new(&scene);
        let set = r.removal_closure(&RemovalRequest::atoms([a(30), a(31)])).unwrap();
        assert_eq!(set.structures, [s(2)].into());
        let err = r.removal_closure(&RemovalRequest::atoms([a(99)])).unwrap_err();
        assert!(matches!(err, SceneError::InconsistentRemoval(_)));
    }
}
