//! Scene to exchange records.

use super::format::{
    endpoint_kind_name, AnnotationRecord, AtomRecord, BondRecord, ControlPointRecord, HydrophobicRecord,
    IntermolecularRecord, RingRecord, RingSystemRecord, SceneDescription, StructureRecord,
};
use crate::store::{Representation, Scene, Structure};
use crate::types::{Endpoint, IntermolecularEdge};

fn structure_record(s: &Structure) -> StructureRecord {
    StructureRecord {
        id: s.id,
        name: s.name.clone(),
        kind: s.kind.to_string(),
        circle: s.representation == Representation::Circle,
        atoms: s
            .atoms()
            .map(|a| AtomRecord {
                id: a.id,
                element: a.element.clone(),
                label: a.label.clone(),
                coordinates: a.coordinates,
                hydrogen_count: a.hydrogen_count,
                charge: a.charge,
                enabled: a.enabled,
                hidden: a.hidden,
            })
            .collect(),
        bonds: s
            .edges()
            .map(|e| BondRecord {
                id: e.id,
                from: e.from,
                to: e.to,
                bond_type: e.bond_type.to_string(),
            })
            .collect(),
        rings: Some(
            s.rings()
                .map(|r| RingRecord {
                    id: r.id,
                    atoms: r.atoms.clone(),
                })
                .collect(),
        ),
        ring_systems: Some(
            s.ring_systems()
                .map(|r| RingSystemRecord {
                    id: r.id,
                    atoms: r.atoms.iter().copied().collect(),
                    rings: r.rings.iter().copied().collect(),
                })
                .collect(),
        ),
    }
}

fn raw(endpoint: Endpoint) -> u32 {
    match endpoint {
        Endpoint::Atom(id) => id.value(),
        Endpoint::Ring(id) => id.value(),
        Endpoint::Annotation(id) => id.value(),
    }
}

fn intermolecular_record(edge: &IntermolecularEdge) -> IntermolecularRecord {
    let (default_from, default_to) = edge.kind.default_endpoint_kinds();
    let explicit = |endpoint: Endpoint, default| {
        (endpoint.kind() != default).then(|| endpoint_kind_name(endpoint.kind()).to_string())
    };
    IntermolecularRecord {
        id: edge.id,
        from: raw(edge.from),
        to: raw(edge.to),
        from_structure: edge.from_structure,
        to_structure: edge.to_structure,
        from_type: explicit(edge.from, default_from),
        to_type: explicit(edge.to, default_to),
    }
}

/// Committed scene state as an exchange description.
pub fn export_scene(scene: &Scene) -> SceneDescription {
    let mut out = SceneDescription {
        structures: scene.structures().map(structure_record).collect(),
        annotations: scene
            .annotations()
            .map(|a| AnnotationRecord {
                id: a.id,
                label: a.label.clone(),
                coordinates: a.coordinates,
                size: a.size,
                belongs_to: a.belongs_to,
                atom_links: a.atom_links.iter().copied().collect(),
            })
            .collect(),
        hydrophobic_contacts: scene
            .hydrophobic_contacts()
            .map(|h| HydrophobicRecord {
                id: h.id,
                belongs_to: h.belongs_to,
                control_points: h
                    .control_points
                    .iter()
                    .map(|c| ControlPointRecord {
                        id: c.id,
                        coordinates: c.coordinates,
                        atom_links: c.atom_links.iter().copied().collect(),
                    })
                    .collect(),
            })
            .collect(),
        ..SceneDescription::default()
    };
    for edge in scene.intermolecular_edges() {
        out.intermolecular_mut(edge.kind).push(intermolecular_record(edge));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::scene_fingerprint;
    use crate::config::EditorConfig;
    use crate::io::plan_import;

    #[test]
    fn test_export_reimport_reproduces_scene() {
        let json = r#"{
            "structures": [{"id": 3, "name": "BEN", "kind": "ligand",
                "atoms": [
                    {"id": 1, "element": "C", "coordinates": [0.0, 0.0]},
                    {"id": 2, "element": "C", "coordinates": [10.0, 0.0]},
                    {"id": 3, "element": "N", "coordinates": [5.0, 8.0], "charge": 1}
                ],
                "bonds": [
                    {"id": 1, "from": 1, "to": 2, "type": "up"},
                    {"id": 2, "from": 2, "to": 3},
                    {"id": 3, "from": 3, "to": 1, "type": "double"}
                ]}],
            "annotations": [{"id": 4, "label": "L", "coordinates": [0.0, 20.0], "size": [2.0, 2.0], "belongsTo": 3}],
            "cationPiStackings": [{"id": 2, "from": 0, "to": 3, "fromStructure": 3, "toStructure": 3}],
            "distances": [{"id": 0, "from": 4, "to": 1, "toStructure": 3, "fromType": "annotation"}]
        }"#;
        let desc = SceneDescription::from_json_str(json).unwrap();
        let config = EditorConfig::default();
        let mut first = Scene::new();
        first
            .insert_fragment(&plan_import(&first, &desc, &config).unwrap().fragment)
            .unwrap();

        let exported = export_scene(&first);
        assert_eq!(exported.distances[0].from_type.as_deref(), Some("annotation"));
        assert!(exported.cation_pi_stackings[0].from_type.is_none());

        let text = exported.to_json_string().unwrap();
        let again = SceneDescription::from_json_str(&text).unwrap();
        let mut second = Scene::new();
        second
            .insert_fragment(&plan_import(&second, &again, &config).unwrap().fragment)
            .unwrap();
        assert_eq!(scene_fingerprint(&first), scene_fingerprint(&second));
    }
}
