//! Error types for scene operations.

use std::fmt;

use crate::types::{AtomId, IntermolecularKind, StructureId};

/// Entity collection named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Atom.
    Atom,
    /// Bond.
    Edge,
    /// Structure.
    Structure,
    /// Ring (structure scoped).
    Ring,
    /// Ring system (structure scoped).
    RingSystem,
    /// Annotation.
    Annotation,
    /// Hydrophobic contact spline.
    HydrophobicContact,
    /// Control point (spline scoped).
    ControlPoint,
    /// Intermolecular edge of the given kind.
    Intermolecular(IntermolecularKind),
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom => write!(f, "atom"),
            Self::Edge => write!(f, "bond"),
            Self::Structure => write!(f, "structure"),
            Self::Ring => write!(f, "ring"),
            Self::RingSystem => write!(f, "ring system"),
            Self::Annotation => write!(f, "annotation"),
            Self::HydrophobicContact => write!(f, "hydrophobic contact"),
            Self::ControlPoint => write!(f, "control point"),
            Self::Intermolecular(kind) => write!(f, "{} edge", kind),
        }
    }
}

/// Errors raised by the graph store, resolver and editor.
///
/// Every variant is raised before any state is mutated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// An entity references another entity that does not exist.
    #[error("Referential integrity violation: {entity} references missing {missing}")]
    ReferentialIntegrity {
        /// The referencing entity (e.g. "bond#4").
        entity: String,
        /// The missing target (e.g. "atom#9").
        missing: String,
    },
    /// An id is already taken within its kind.
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId {
        /// Collection the collision happened in.
        kind: EntityKind,
        /// Raw id value.
        id: u32,
    },
    /// A removal request cannot be resolved.
    #[error("Inconsistent removal request: {0}")]
    InconsistentRemoval(String),
    /// Structure not found.
    #[error("Structure not found: {0}")]
    UnknownStructure(StructureId),
    /// Atom not found.
    #[error("Atom not found: {0}")]
    UnknownAtom(AtomId),
    /// An operation needed at least one target.
    #[error("Operation requires at least one target")]
    EmptySelection,
}

impl SceneError {
    /// Build a referential integrity error from any two displayable ids.
    pub fn dangling(entity: impl fmt::Display, missing: impl fmt::Display) -> Self {
        Self::ReferentialIntegrity {
            entity: entity.to_string(),
            missing: missing.to_string(),
        }
    }

    /// Build a duplicate id error.
    pub fn duplicate(kind: EntityKind, id: u32) -> Self {
        Self::DuplicateId { kind, id }
    }
}

/// Errors raised while reading a scene description.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The input is not valid JSON for the exchange format.
    #[error("Malformed scene description: {0}")]
    Format(#[from] serde_json::Error),
    /// The input is well-formed but violates scene invariants.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// Renumbering would need ids past `u32::MAX`.
    #[error("No {kind} ids left above the current maximum")]
    IdSpaceExhausted {
        /// Kind whose id range ran out.
        kind: EntityKind,
    },
    /// An enumerated string field holds an unknown value.
    #[error("Unknown {field} value: {value:?}")]
    UnknownValue {
        /// Field name in the exchange format.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

/// Result alias for scene operations.
pub type Result<T, E = SceneError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeId;

    #[test]
    fn test_messages() {
        let e = SceneError::dangling(EdgeId::new(4), AtomId::new(9));
        assert_eq!(e.to_string(), "Referential integrity violation: bond#4 references missing atom#9");

        let e = SceneError::duplicate(EntityKind::Intermolecular(IntermolecularKind::PiStacking), 3);
        assert_eq!(e.to_string(), "Duplicate pi_stacking edge id: 3");
    }
}
