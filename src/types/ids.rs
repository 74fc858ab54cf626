//! Identifier newtypes for scene entities.
//!
//! Every entity kind gets its own integer newtype so an atom id can never be
//! used to look up an edge. All ids implement `Ord` so collections keyed by
//! them iterate deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::intermolecular::IntermolecularKind;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an id from its raw value.
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Get the raw value.
            pub const fn value(&self) -> u32 {
                self.0
            }

            /// The id directly after this one.
            pub const fn next(&self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Scene-wide unique atom identifier.
    AtomId,
    "atom#"
);
entity_id!(
    /// Scene-wide unique bond identifier.
    EdgeId,
    "bond#"
);
entity_id!(
    /// Scene-wide unique structure identifier.
    StructureId,
    "structure#"
);
entity_id!(
    /// Ring identifier, unique within its structure.
    RingId,
    "ring#"
);
entity_id!(
    /// Ring system identifier, unique within its structure.
    RingSystemId,
    "ringsystem#"
);
entity_id!(
    /// Scene-wide unique annotation identifier.
    AnnotationId,
    "annotation#"
);
entity_id!(
    /// Scene-wide unique hydrophobic contact (spline) identifier.
    HydrophobicId,
    "hydrophobic#"
);
entity_id!(
    /// Control point identifier, unique within its spline.
    ControlPointId,
    "cp#"
);
entity_id!(
    /// Intermolecular edge identifier, unique within its kind.
    IntermolecularId,
    "inter#"
);

/// Fully qualified intermolecular edge reference.
///
/// Ids are only unique per kind, so every scene-wide lookup goes through
/// the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntermolecularKey {
    /// Which of the five collections the edge lives in.
    pub kind: IntermolecularKind,
    /// Id within that collection.
    pub id: IntermolecularId,
}

impl IntermolecularKey {
    /// Create a key.
    pub fn new(kind: IntermolecularKind, id: IntermolecularId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for IntermolecularKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering_and_display() {
        let a = AtomId::new(3);
        let b = AtomId::new(10);
        assert!(a < b);
        assert_eq!(a.next(), AtomId::new(4));
        assert_eq!(a.to_string(), "atom#3");
        assert_eq!(EdgeId::from(7).value(), 7);
    }

    #[test]
    fn test_key_orders_by_kind_then_id() {
        let k1 = IntermolecularKey::new(IntermolecularKind::AtomPair, IntermolecularId::new(9));
        let k2 = IntermolecularKey::new(IntermolecularKind::PiStacking, IntermolecularId::new(0));
        assert!(k1 < k2);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&StructureId::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
