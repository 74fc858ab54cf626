//! Intermolecular edges: interactions drawn between entities that may live
//! in different structures.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AnnotationId, AtomId, IntermolecularId, IntermolecularKey, RingId, StructureId};

/// The five intermolecular edge collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntermolecularKind {
    /// Atom-pair interaction (hydrogen bond, salt bridge, metal contact).
    AtomPair,
    /// Ring to ring stacking.
    PiStacking,
    /// Charged atom to ring.
    CationPiStacking,
    /// Plain distance measurement.
    Distance,
    /// Any other user-defined interaction.
    Interaction,
}

impl IntermolecularKind {
    /// All kinds in storage order.
    pub const ALL: [IntermolecularKind; 5] = [
        Self::AtomPair,
        Self::PiStacking,
        Self::CationPiStacking,
        Self::Distance,
        Self::Interaction,
    ];

    /// Parse kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "atom_pair" | "atompairinteraction" | "atom_pair_interaction" => Some(Self::AtomPair),
            "pi_stacking" | "pistacking" => Some(Self::PiStacking),
            "cation_pi_stacking" | "cationpistacking" => Some(Self::CationPiStacking),
            "distance" => Some(Self::Distance),
            "interaction" => Some(Self::Interaction),
            _ => None,
        }
    }

    /// Endpoint kinds assumed when a record does not state them.
    pub fn default_endpoint_kinds(&self) -> (EndpointKind, EndpointKind) {
        match self {
            Self::AtomPair | Self::Distance | Self::Interaction => (EndpointKind::Atom, EndpointKind::Atom),
            Self::PiStacking => (EndpointKind::Ring, EndpointKind::Ring),
            Self::CationPiStacking => (EndpointKind::Ring, EndpointKind::Atom),
        }
    }
}

impl fmt::Display for IntermolecularKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtomPair => write!(f, "atom_pair"),
            Self::PiStacking => write!(f, "pi_stacking"),
            Self::CationPiStacking => write!(f, "cation_pi_stacking"),
            Self::Distance => write!(f, "distance"),
            Self::Interaction => write!(f, "interaction"),
        }
    }
}

/// Discriminant of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// Atom endpoint.
    Atom,
    /// Ring endpoint (drawn at the ring centroid).
    Ring,
    /// Annotation endpoint.
    Annotation,
}

/// One end of an intermolecular edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Endpoint {
    /// An atom, in the structure named by the edge.
    Atom(AtomId),
    /// A ring, in the structure named by the edge.
    Ring(RingId),
    /// An annotation.
    Annotation(AnnotationId),
}

impl Endpoint {
    /// Discriminant.
    pub fn kind(&self) -> EndpointKind {
        match self {
            Self::Atom(_) => EndpointKind::Atom,
            Self::Ring(_) => EndpointKind::Ring,
            Self::Annotation(_) => EndpointKind::Annotation,
        }
    }
}

/// Edge between two endpoints, possibly in different structures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermolecularEdge {
    /// Identifier, unique within `kind`.
    pub id: IntermolecularId,
    /// Which collection the edge belongs to.
    pub kind: IntermolecularKind,
    /// First endpoint.
    pub from: Endpoint,
    /// Second endpoint.
    pub to: Endpoint,
    /// Structure owning `from`; `None` for annotation endpoints.
    pub from_structure: Option<StructureId>,
    /// Structure owning `to`; `None` for annotation endpoints.
    pub to_structure: Option<StructureId>,
}

impl IntermolecularEdge {
    /// Create an edge between two structure-owned endpoints.
    pub fn new(
        id: IntermolecularId,
        kind: IntermolecularKind,
        from: (StructureId, Endpoint),
        to: (StructureId, Endpoint),
    ) -> Self {
        Self {
            id,
            kind,
            from: from.1,
            to: to.1,
            from_structure: Some(from.0),
            to_structure: Some(to.0),
        }
    }

    /// Scene-wide key.
    pub fn key(&self) -> IntermolecularKey {
        IntermolecularKey::new(self.kind, self.id)
    }

    /// Both endpoints with their owning structures.
    pub fn endpoints(&self) -> [(Option<StructureId>, Endpoint); 2] {
        [(self.from_structure, self.from), (self.to_structure, self.to)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in IntermolecularKind::ALL {
            assert_eq!(IntermolecularKind::from_str(&kind.to_string()), Some(kind));
        }
    }

    #[test]
    fn test_endpoint_serialization_is_tagged() {
        let json = serde_json::to_string(&Endpoint::Ring(RingId::new(2))).unwrap();
        assert_eq!(json, r#"{"type":"ring","id":2}"#);
    }
}
