//! Bond (edge) types for the structure graph.

use serde::{Deserialize, Serialize};

use super::ids::{AtomId, EdgeId};

/// Bond order or depiction variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondType {
    /// Single bond.
    Single,
    /// Double bond.
    Double,
    /// Triple bond.
    Triple,
    /// Aromatic bond.
    Aromatic,
    /// Single bond with undefined stereo (wavy).
    StereoEither,
    /// Double bond with undefined cis/trans configuration (crossed).
    StereoCisTrans,
    /// Wedge pointing towards the viewer.
    Up,
    /// Hashed wedge pointing away from the viewer.
    Down,
}

impl BondType {
    /// Parse bond type from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" | "1" | "" => Some(Self::Single),
            "double" | "2" => Some(Self::Double),
            "triple" | "3" => Some(Self::Triple),
            "aromatic" | "ar" => Some(Self::Aromatic),
            "stereo_either" | "either" => Some(Self::StereoEither),
            "stereo_cis_trans" | "cistrans" => Some(Self::StereoCisTrans),
            "up" | "wedge" => Some(Self::Up),
            "down" | "hash" => Some(Self::Down),
            _ => None,
        }
    }

    /// Bond type after mirroring the drawing: wedges swap so the depicted
    /// configuration stays consistent with the mirrored image.
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            other => *other,
        }
    }
}

impl Default for BondType {
    fn default() -> Self {
        Self::Single
    }
}

impl std::fmt::Display for BondType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
            Self::Triple => write!(f, "triple"),
            Self::Aromatic => write!(f, "aromatic"),
            Self::StereoEither => write!(f, "stereo_either"),
            Self::StereoCisTrans => write!(f, "stereo_cis_trans"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Bond between two atoms of the same structure.
///
/// The pair is ordered: `from` is the wedge origin for stereo bonds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Unique bond identifier.
    pub id: EdgeId,
    /// First atom.
    pub from: AtomId,
    /// Second atom.
    pub to: AtomId,
    /// Bond order / depiction.
    pub bond_type: BondType,
    /// Whether the bond lies on a ring. Derived by ring perception.
    pub cyclic: bool,
}

impl Edge {
    /// Create a new acyclic edge.
    pub fn new(id: EdgeId, from: AtomId, to: AtomId, bond_type: BondType) -> Self {
        Self {
            id,
            from,
            to,
            bond_type,
            cyclic: false,
        }
    }

    /// Create a single bond.
    pub fn single(id: EdgeId, from: AtomId, to: AtomId) -> Self {
        Self::new(id, from, to, BondType::Single)
    }

    /// The endpoint opposite `atom`, `None` if `atom` is not an endpoint.
    pub fn other(&self, atom: AtomId) -> Option<AtomId> {
        if atom == self.from {
            Some(self.to)
        } else if atom == self.to {
            Some(self.from)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_endpoint() {
        let e = Edge::single(EdgeId::new(1), AtomId::new(2), AtomId::new(3));
        assert_eq!(e.other(AtomId::new(2)), Some(AtomId::new(3)));
        assert_eq!(e.other(AtomId::new(3)), Some(AtomId::new(2)));
        assert_eq!(e.other(AtomId::new(4)), None);
    }

    #[test]
    fn test_bond_type_parse_and_display() {
        for t in [
            BondType::Single,
            BondType::Double,
            BondType::Triple,
            BondType::Aromatic,
            BondType::StereoEither,
            BondType::StereoCisTrans,
            BondType::Up,
            BondType::Down,
        ] {
            assert_eq!(BondType::from_str(&t.to_string()), Some(t));
        }
        assert_eq!(BondType::from_str("wedge"), Some(BondType::Up));
        assert_eq!(BondType::from_str("quadruple"), None);
    }

    #[test]
    fn test_mirror_swaps_wedges_only() {
        assert_eq!(BondType::Up.mirrored(), BondType::Down);
        assert_eq!(BondType::Down.mirrored(), BondType::Up);
        assert_eq!(BondType::Double.mirrored(), BondType::Double);
    }
}
