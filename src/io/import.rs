//! Building scene fragments from exchange records.
//!
//! Merging into a non-empty scene renumbers every incoming id above the
//! current maximum of its kind and shifts the fragment to the right of the
//! existing content. References to ids the fragment does not define are
//! left as they are, so a fragment may point at already-loaded entities.

use glam::DVec2;
use std::collections::{BTreeMap, BTreeSet};

use super::format::{parse_endpoint_kind, IntermolecularRecord, SceneDescription, StructureRecord};
use crate::config::EditorConfig;
use crate::edit::SceneFragment;
use crate::error::{EntityKind, ImportError, SceneError};
use crate::store::{Representation, Scene, Structure, StructureKind};
use crate::types::{
    Annotation, AnnotationId, Atom, AtomId, BondType, ControlPoint, Edge, EdgeId, Endpoint, EndpointKind,
    HydrophobicContact, HydrophobicId, IntermolecularEdge, IntermolecularId, IntermolecularKind, Limits, Ring,
    RingId, RingSystem, StructureId,
};

/// Raw id translation for one entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap(BTreeMap<u32, u32>);

impl IdMap {
    /// Map `incoming` ids (deduplicated, ascending) onto `max + 1, max + 2, ...`.
    /// Without a maximum every id maps to itself.
    fn above(kind: EntityKind, max: Option<u32>, incoming: impl IntoIterator<Item = u32>) -> Result<Self, ImportError> {
        let sorted: BTreeSet<u32> = incoming.into_iter().collect();
        let Some(mut last) = max else {
            return Ok(Self(sorted.into_iter().map(|id| (id, id)).collect()));
        };
        let mut map = BTreeMap::new();
        for id in sorted {
            last = last.checked_add(1).ok_or(ImportError::IdSpaceExhausted { kind })?;
            map.insert(id, last);
        }
        Ok(Self(map))
    }

    /// Translated id; ids outside the fragment are kept.
    pub fn get(&self, raw: u32) -> u32 {
        self.0.get(&raw).copied().unwrap_or(raw)
    }

    /// Whether any id changed.
    pub fn is_identity(&self) -> bool {
        self.0.iter().all(|(from, to)| from == to)
    }
}

/// Id translations applied by one import.
#[derive(Debug, Clone, Default)]
pub struct Renumbering {
    pub structures: IdMap,
    pub atoms: IdMap,
    pub edges: IdMap,
    pub annotations: IdMap,
    pub hydrophobic_contacts: IdMap,
    pub intermolecular: BTreeMap<IntermolecularKind, IdMap>,
}

impl Renumbering {
    fn plan(scene: &Scene, description: &SceneDescription, renumber: bool) -> Result<Self, ImportError> {
        let marks = scene.max_ids();
        let pick = |max: Option<u32>| if renumber { max } else { None };
        let intermolecular = IntermolecularKind::ALL
            .iter()
            .map(|kind| {
                let max = pick(marks.intermolecular.get(kind).copied());
                let ids = description.intermolecular(*kind).iter().map(|r| r.id.value());
                Ok((*kind, IdMap::above(EntityKind::Intermolecular(*kind), max, ids)?))
            })
            .collect::<Result<_, ImportError>>()?;
        Ok(Self {
            structures: IdMap::above(
                EntityKind::Structure,
                pick(marks.structure),
                description.structures.iter().map(|s| s.id.value()),
            )?,
            atoms: IdMap::above(
                EntityKind::Atom,
                pick(marks.atom),
                description.structures.iter().flat_map(|s| s.atoms.iter().map(|a| a.id.value())),
            )?,
            edges: IdMap::above(
                EntityKind::Edge,
                pick(marks.edge),
                description.structures.iter().flat_map(|s| s.bonds.iter().map(|b| b.id.value())),
            )?,
            annotations: IdMap::above(
                EntityKind::Annotation,
                pick(marks.annotation),
                description.annotations.iter().map(|a| a.id.value()),
            )?,
            hydrophobic_contacts: IdMap::above(
                EntityKind::HydrophobicContact,
                pick(marks.hydrophobic),
                description.hydrophobic_contacts.iter().map(|h| h.id.value()),
            )?,
            intermolecular,
        })
    }

    fn structure(&self, id: StructureId) -> StructureId {
        StructureId::new(self.structures.get(id.value()))
    }

    fn atom(&self, id: AtomId) -> AtomId {
        AtomId::new(self.atoms.get(id.value()))
    }

    fn annotation(&self, id: AnnotationId) -> AnnotationId {
        AnnotationId::new(self.annotations.get(id.value()))
    }
}

/// A fragment ready to insert plus how it was placed.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub fragment: SceneFragment,
    /// Translation applied to every incoming coordinate.
    pub offset: DVec2,
    pub renumbering: Renumbering,
}

/// Bounds of every positioned record in `description`.
fn description_limits(description: &SceneDescription) -> Option<Limits> {
    let atoms = description
        .structures
        .iter()
        .flat_map(|s| s.atoms.iter().map(|a| a.coordinates));
    let annotations = description.annotations.iter().map(|a| a.coordinates);
    let control_points = description
        .hydrophobic_contacts
        .iter()
        .flat_map(|h| h.control_points.iter().map(|c| c.coordinates));
    Limits::from_points(atoms.chain(annotations).chain(control_points))
}

/// Offset placing `incoming` to the right of `existing`, top-aligned.
fn placement_offset(existing: Option<Limits>, incoming: Option<Limits>, spacing: f64) -> DVec2 {
    match (existing, incoming) {
        (Some(existing), Some(incoming)) => DVec2::new(
            existing.max.x + spacing - incoming.min.x,
            existing.min.y - incoming.min.y,
        ),
        _ => DVec2::ZERO,
    }
}

fn build_structure(record: &StructureRecord, ids: &Renumbering, offset: DVec2) -> Result<Structure, ImportError> {
    let kind = StructureKind::from_str(&record.kind).ok_or_else(|| ImportError::UnknownValue {
        field: "kind",
        value: record.kind.clone(),
    })?;
    let mut structure = Structure::new(ids.structure(record.id), record.name.clone(), kind);
    if record.circle {
        structure.representation = Representation::Circle;
    }

    for a in &record.atoms {
        let mut atom = Atom::new(ids.atom(a.id), a.element.clone(), a.coordinates + offset);
        atom.label = a.label.clone();
        atom.hydrogen_count = a.hydrogen_count;
        atom.charge = a.charge;
        atom.enabled = a.enabled;
        atom.hidden = a.hidden;
        structure.add_atom(atom)?;
    }
    for b in &record.bonds {
        let bond_type = BondType::from_str(&b.bond_type).ok_or_else(|| ImportError::UnknownValue {
            field: "type",
            value: b.bond_type.clone(),
        })?;
        let id = EdgeId::new(ids.edges.get(b.id.value()));
        structure.add_edge(Edge::new(id, ids.atom(b.from), ids.atom(b.to), bond_type))?;
    }

    match &record.rings {
        Some(rings) => {
            for r in rings {
                structure.add_ring(Ring::new(r.id, r.atoms.iter().map(|a| ids.atom(*a)).collect()))?;
            }
            for sys in record.ring_systems.iter().flatten() {
                structure.add_ring_system(RingSystem::new(
                    sys.id,
                    sys.atoms.iter().map(|a| ids.atom(*a)).collect(),
                    sys.rings.iter().copied().collect(),
                ))?;
            }
            // Supplied systems keep their ids where they match the rings.
            structure.refresh_ring_systems();
        }
        None => structure.perceive_rings(),
    }
    structure.post_process_atoms();
    structure.calc_boundaries();
    Ok(structure)
}

fn build_endpoint(
    kind: EndpointKind,
    raw: u32,
    structure: Option<StructureId>,
    ids: &Renumbering,
) -> (Option<StructureId>, Endpoint) {
    let structure = structure.map(|s| ids.structure(s));
    match kind {
        EndpointKind::Atom => (structure, Endpoint::Atom(ids.atom(AtomId::new(raw)))),
        // Ring ids are per structure and never renumbered.
        EndpointKind::Ring => (structure, Endpoint::Ring(RingId::new(raw))),
        EndpointKind::Annotation => (None, Endpoint::Annotation(ids.annotation(AnnotationId::new(raw)))),
    }
}

fn build_intermolecular(
    kind: IntermolecularKind,
    record: &IntermolecularRecord,
    ids: &Renumbering,
    scene: &Scene,
    structures: &BTreeMap<AtomId, StructureId>,
) -> Result<IntermolecularEdge, ImportError> {
    let (default_from, default_to) = kind.default_endpoint_kinds();
    let from_kind = match &record.from_type {
        Some(s) => parse_endpoint_kind("fromType", s)?,
        None => default_from,
    };
    let to_kind = match &record.to_type {
        Some(s) => parse_endpoint_kind("toType", s)?,
        None => default_to,
    };

    // Atom endpoints may omit their structure; look it up from the fragment
    // first, then from the scene.
    let resolve = |ek: EndpointKind, raw: u32, given: Option<StructureId>| -> (Option<StructureId>, Endpoint) {
        let (sid, endpoint) = build_endpoint(ek, raw, given, ids);
        match (sid, endpoint) {
            (None, Endpoint::Atom(atom)) => {
                let owner = structures.get(&atom).copied().or_else(|| scene.structure_of_atom(atom));
                (owner, endpoint)
            }
            _ => (sid, endpoint),
        }
    };
    let (from_structure, from) = resolve(from_kind, record.from, record.from_structure);
    let (to_structure, to) = resolve(to_kind, record.to, record.to_structure);

    let id = ids
        .intermolecular
        .get(&kind)
        .map(|m| m.get(record.id.value()))
        .unwrap_or(record.id.value());
    Ok(IntermolecularEdge {
        id: IntermolecularId::new(id),
        kind,
        from,
        to,
        from_structure,
        to_structure,
    })
}

/// Structure owning every atom in `links`, looked up in the fragment first and
/// then in the scene. `Ok(None)` when there are no links.
fn link_owner(
    links: &BTreeSet<AtomId>,
    scene: &Scene,
    structures: &BTreeMap<AtomId, StructureId>,
) -> Result<Option<StructureId>, String> {
    let mut owner = None;
    for atom in links {
        let Some(sid) = structures.get(atom).copied().or_else(|| scene.structure_of_atom(*atom)) else {
            return Err(format!("owning structure of {}", atom));
        };
        match owner {
            Some(seen) if seen != sid => return Err(format!("single structure for {} and {}", seen, sid)),
            _ => owner = Some(sid),
        }
    }
    Ok(owner)
}

/// Turn `description` into a fragment that can be inserted into `scene`.
///
/// Nothing is checked against the scene here beyond id allocation;
/// insertion performs the referential checks.
pub fn plan_import(
    scene: &Scene,
    description: &SceneDescription,
    config: &EditorConfig,
) -> Result<ImportPlan, ImportError> {
    let merging = !scene.is_empty();
    let ids = Renumbering::plan(scene, description, merging && config.renumber_on_import)?;
    let offset = if merging {
        placement_offset(scene.limits(), description_limits(description), config.import_spacing)
    } else {
        DVec2::ZERO
    };

    let structures = description
        .structures
        .iter()
        .map(|s| build_structure(s, &ids, offset))
        .collect::<Result<Vec<_>, _>>()?;
    let atom_structure: BTreeMap<AtomId, StructureId> = structures
        .iter()
        .flat_map(|s| s.atoms().map(move |a| (a.id, s.id)))
        .collect();

    let annotations = description
        .annotations
        .iter()
        .map(|a| {
            let ann = Annotation::new(ids.annotation(a.id), a.label.clone(), a.coordinates + offset, a.size);
            let links: BTreeSet<AtomId> = a.atom_links.iter().map(|x| ids.atom(*x)).collect();
            let owner = match a.belongs_to {
                Some(sid) => Some(ids.structure(sid)),
                None => link_owner(&links, scene, &atom_structure).map_err(|missing| SceneError::dangling(ann.id, missing))?,
            };
            Ok(match owner {
                Some(sid) => ann.attached(sid, links),
                None => ann,
            })
        })
        .collect::<Result<Vec<_>, ImportError>>()?;

    let hydrophobic_contacts = description
        .hydrophobic_contacts
        .iter()
        .map(|h| {
            let points = h
                .control_points
                .iter()
                .map(|c| ControlPoint::new(c.id, c.coordinates + offset).linked(c.atom_links.iter().map(|x| ids.atom(*x))))
                .collect();
            HydrophobicContact::new(
                HydrophobicId::new(ids.hydrophobic_contacts.get(h.id.value())),
                ids.structure(h.belongs_to),
                points,
            )
        })
        .collect();

    let mut intermolecular = Vec::new();
    for kind in IntermolecularKind::ALL {
        for record in description.intermolecular(kind) {
            intermolecular.push(build_intermolecular(kind, record, &ids, scene, &atom_structure)?);
        }
    }

    let fragment = SceneFragment {
        structures,
        annotations,
        hydrophobic_contacts,
        intermolecular,
    };
    tracing::debug!(
        structures = fragment.structures.len(),
        atoms = fragment.atom_count(),
        dx = offset.x,
        dy = offset.y,
        renumbered = !ids.atoms.is_identity() || !ids.structures.is_identity(),
        "Planned import"
    );
    Ok(ImportPlan {
        fragment,
        offset,
        renumbering: ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = r#"{
        "structures": [{
            "id": 1, "name": "HOH", "kind": "water",
            "atoms": [
                {"id": 1, "element": "O", "coordinates": [0.0, 0.0]},
                {"id": 2, "element": "H", "coordinates": [5.0, 5.0]}
            ],
            "bonds": [{"id": 1, "from": 1, "to": 2}]
        }],
        "annotations": [{"id": 1, "label": "W1", "coordinates": [0.0, -10.0], "size": [4.0, 2.0],
                         "belongsTo": 1, "atomLinks": [1]}],
        "distances": [{"id": 0, "from": 1, "to": 2, "fromStructure": 1, "toStructure": 1}]
    }"#;

    #[test]
    fn test_first_import_keeps_ids() {
        let desc = SceneDescription::from_json_str(WATER).unwrap();
        let plan = plan_import(&Scene::new(), &desc, &EditorConfig::default()).unwrap();
        assert_eq!(plan.offset, DVec2::ZERO);
        assert_eq!(plan.fragment.structures[0].id, StructureId::new(1));
        assert!(plan.renumbering.atoms.is_identity());
    }

    #[test]
    fn test_merge_renumbers_and_offsets() {
        let desc = SceneDescription::from_json_str(WATER).unwrap();
        let config = EditorConfig::default();
        let mut scene = Scene::new();
        scene
            .insert_fragment(&plan_import(&scene, &desc, &config).unwrap().fragment)
            .unwrap();

        let plan = plan_import(&scene, &desc, &config).unwrap();
        let s = &plan.fragment.structures[0];
        assert_eq!(s.id, StructureId::new(2));
        let atom_ids: Vec<u32> = s.atoms().map(|a| a.id.value()).collect();
        assert_eq!(atom_ids, vec![3, 4]);
        assert_eq!(plan.fragment.annotations[0].atom_links, [AtomId::new(3)].into());
        assert_eq!(plan.fragment.intermolecular[0].id, IntermolecularId::new(1));

        // Existing bounds span x up to 5 plus the annotation box; the
        // incoming fragment starts at x = 0.
        let existing = scene.limits().unwrap();
        assert_eq!(plan.offset.x, existing.max.x + config.import_spacing);
        assert_eq!(plan.offset.y, existing.min.y - (-10.0));
        let moved = s.atom(AtomId::new(3)).unwrap().coordinates;
        assert_eq!(moved, plan.offset);

        scene.insert_fragment(&plan.fragment).unwrap();
        assert!(scene.validate().is_empty());
    }

    #[test]
    fn test_merge_past_largest_id_is_rejected() {
        let json = WATER.replace(r#""id": 1, "name": "HOH""#, r#""id": 4294967295, "name": "HOH""#);
        let json = json.replace(r#""belongsTo": 1"#, r#""belongsTo": 4294967295"#);
        let json = json.replace(r#""fromStructure": 1, "toStructure": 1"#, r#""fromStructure": 4294967295, "toStructure": 4294967295"#);
        let desc = SceneDescription::from_json_str(&json).unwrap();
        let config = EditorConfig::default();
        let mut scene = Scene::new();
        scene
            .insert_fragment(&plan_import(&scene, &desc, &config).unwrap().fragment)
            .unwrap();

        let err = plan_import(&scene, &desc, &config).unwrap_err();
        assert!(matches!(
            err,
            ImportError::IdSpaceExhausted {
                kind: EntityKind::Structure
            }
        ));

        // The last free id is still handed out.
        let below = IdMap::above(EntityKind::Atom, Some(u32::MAX - 1), [7]).unwrap();
        assert_eq!(below.get(7), u32::MAX);
        assert!(IdMap::above(EntityKind::Atom, Some(u32::MAX - 1), [7, 8]).is_err());
    }

    #[test]
    fn test_unattached_annotation_links_infer_structure() {
        let json = WATER.replace(r#""belongsTo": 1, "atomLinks": [1]"#, r#""atomLinks": [1]"#);
        let desc = SceneDescription::from_json_str(&json).unwrap();
        let plan = plan_import(&Scene::new(), &desc, &EditorConfig::default()).unwrap();
        let ann = &plan.fragment.annotations[0];
        assert_eq!(ann.belongs_to, Some(StructureId::new(1)));
        assert_eq!(ann.atom_links, [AtomId::new(1)].into());

        let json = WATER.replace(r#""belongsTo": 1, "atomLinks": [1]"#, r#""atomLinks": [9]"#);
        let desc = SceneDescription::from_json_str(&json).unwrap();
        let err = plan_import(&Scene::new(), &desc, &EditorConfig::default()).unwrap_err();
        assert!(matches!(err, ImportError::Scene(SceneError::ReferentialIntegrity { .. })));
    }

    #[test]
    fn test_unknown_bond_type() {
        let json = WATER.replace(r#""to": 2}]"#, r#""to": 2, "type": "quadruple"}]"#);
        let desc = SceneDescription::from_json_str(&json).unwrap();
        let err = plan_import(&Scene::new(), &desc, &EditorConfig::default()).unwrap_err();
        assert!(matches!(err, ImportError::UnknownValue { field: "type", .. }));
    }

    #[test]
    fn test_rings_perceived_when_absent() {
        let json = r#"{"structures": [{"id": 1, "kind": "ligand",
            "atoms": [
                {"id": 1, "element": "C", "coordinates": [0.0, 0.0]},
                {"id": 2, "element": "C", "coordinates": [10.0, 0.0]},
                {"id": 3, "element": "C", "coordinates": [5.0, 8.0]}
            ],
            "bonds": [{"id": 1, "from": 1, "to": 2}, {"id": 2, "from": 2, "to": 3}, {"id": 3, "from": 3, "to": 1}]
        }]}"#;
        let desc = SceneDescription::from_json_str(json).unwrap();
        let plan = plan_import(&Scene::new(), &desc, &EditorConfig::default()).unwrap();
        let s = &plan.fragment.structures[0];
        assert_eq!(s.rings().count(), 1);
        assert_eq!(s.ring_systems().count(), 1);
        assert!(s.edges().all(|e| e.cyclic));
    }
}
