//! Exchange-format records.
//!
//! Field names are camelCase; enumerated values are plain strings so that
//! older files with loose spellings (`"wedge"`, `"aminoacid"`) still load.
//! Coordinates are `[x, y]` arrays.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::types::{
    AnnotationId, AtomId, ControlPointId, EdgeId, EndpointKind, HydrophobicId, IntermolecularId,
    IntermolecularKind, RingId, RingSystemId, StructureId,
};

fn default_true() -> bool {
    true
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero_u8(v: &u8) -> bool {
    *v == 0
}

fn is_zero_i8(v: &i8) -> bool {
    *v == 0
}

/// A complete scene, or a fragment to merge into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneDescription {
    pub structures: Vec<StructureRecord>,
    pub annotations: Vec<AnnotationRecord>,
    pub hydrophobic_contacts: Vec<HydrophobicRecord>,
    pub atom_pair_interactions: Vec<IntermolecularRecord>,
    pub pi_stackings: Vec<IntermolecularRecord>,
    pub cation_pi_stackings: Vec<IntermolecularRecord>,
    pub distances: Vec<IntermolecularRecord>,
    pub interactions: Vec<IntermolecularRecord>,
}

impl SceneDescription {
    pub fn from_json_str(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ImportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Records of one intermolecular kind.
    pub fn intermolecular(&self, kind: IntermolecularKind) -> &[IntermolecularRecord] {
        match kind {
            IntermolecularKind::AtomPair => &self.atom_pair_interactions,
            IntermolecularKind::PiStacking => &self.pi_stackings,
            IntermolecularKind::CationPiStacking => &self.cation_pi_stackings,
            IntermolecularKind::Distance => &self.distances,
            IntermolecularKind::Interaction => &self.interactions,
        }
    }

    pub fn intermolecular_mut(&mut self, kind: IntermolecularKind) -> &mut Vec<IntermolecularRecord> {
        match kind {
            IntermolecularKind::AtomPair => &mut self.atom_pair_interactions,
            IntermolecularKind::PiStacking => &mut self.pi_stackings,
            IntermolecularKind::CationPiStacking => &mut self.cation_pi_stackings,
            IntermolecularKind::Distance => &mut self.distances,
            IntermolecularKind::Interaction => &mut self.interactions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
            && self.annotations.is_empty()
            && self.hydrophobic_contacts.is_empty()
            && IntermolecularKind::ALL.iter().all(|k| self.intermolecular(*k).is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureRecord {
    pub id: StructureId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub circle: bool,
    pub atoms: Vec<AtomRecord>,
    #[serde(default)]
    pub bonds: Vec<BondRecord>,
    /// Absent rings are perceived on import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rings: Option<Vec<RingRecord>>,
    #[serde(default, rename = "ringsystems", skip_serializing_if = "Option::is_none")]
    pub ring_systems: Option<Vec<RingSystemRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomRecord {
    pub id: AtomId,
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub coordinates: DVec2,
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub hydrogen_count: u8,
    #[serde(default, skip_serializing_if = "is_zero_i8")]
    pub charge: i8,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    pub id: EdgeId,
    pub from: AtomId,
    pub to: AtomId,
    #[serde(rename = "type", default)]
    pub bond_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingRecord {
    pub id: RingId,
    pub atoms: Vec<AtomId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSystemRecord {
    pub id: RingSystemId,
    pub atoms: Vec<AtomId>,
    pub rings: Vec<RingId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub label: String,
    pub coordinates: DVec2,
    #[serde(default)]
    pub size: DVec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belongs_to: Option<StructureId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub atom_links: Vec<AtomId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrophobicRecord {
    pub id: HydrophobicId,
    pub belongs_to: StructureId,
    pub control_points: Vec<ControlPointRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPointRecord {
    pub id: ControlPointId,
    pub coordinates: DVec2,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub atom_links: Vec<AtomId>,
}

/// An intermolecular edge. `from`/`to` are raw ids interpreted through
/// `fromType`/`toType`, which default per kind (pi-stackings join rings,
/// cation-pi joins a ring to an atom, everything else joins atoms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermolecularRecord {
    pub id: IntermolecularId,
    pub from: u32,
    pub to: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_structure: Option<StructureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_structure: Option<StructureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_type: Option<String>,
}

/// Parse an endpoint type string.
pub(crate) fn parse_endpoint_kind(field: &'static str, value: &str) -> Result<EndpointKind, ImportError> {
    match value.to_lowercase().as_str() {
        "atom" => Ok(EndpointKind::Atom),
        "ring" => Ok(EndpointKind::Ring),
        "annotation" | "label" => Ok(EndpointKind::Annotation),
        _ => Err(ImportError::UnknownValue {
            field,
            value: value.to_string(),
        }),
    }
}

pub(crate) fn endpoint_kind_name(kind: EndpointKind) -> &'static str {
    match kind {
        EndpointKind::Atom => "atom",
        EndpointKind::Ring => "ring",
        EndpointKind::Annotation => "annotation",
    }
}
