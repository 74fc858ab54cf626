//! Atom records.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AtomId;

/// Side of an atom on which attached text (implicit hydrogens, substituent
/// labels) is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSide {
    /// Towards +x.
    Right,
    /// Towards -x.
    Left,
    /// Towards -y (screen up).
    Up,
    /// Towards +y (screen down).
    Down,
}

impl LabelSide {
    /// Candidate order used when several sides are equally free.
    pub const PREFERENCE: [LabelSide; 4] = [Self::Right, Self::Left, Self::Up, Self::Down];

    /// Unit direction in scene coordinates.
    pub fn direction(&self) -> DVec2 {
        match self {
            Self::Right => DVec2::X,
            Self::Left => DVec2::NEG_X,
            Self::Up => DVec2::NEG_Y,
            Self::Down => DVec2::Y,
        }
    }
}

impl Default for LabelSide {
    fn default() -> Self {
        Self::Right
    }
}

impl fmt::Display for LabelSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Right => write!(f, "right"),
            Self::Left => write!(f, "left"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// An atom of a structure.
///
/// `hydrogen_side` and `label_side` are derived from neighbour geometry by
/// [`Structure::post_process_atoms`](crate::store::Structure::post_process_atoms)
/// and must not be set by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// Unique atom identifier.
    pub id: AtomId,
    /// Element symbol (e.g. "C", "N", "Fe").
    pub element: String,
    /// Optional text replacing the element symbol.
    pub label: Option<String>,
    /// Committed position.
    pub coordinates: DVec2,
    /// In-progress position during a drag; `None` outside gestures.
    pub temp_coordinates: Option<DVec2>,
    /// Number of implicit hydrogens drawn next to the label.
    pub hydrogen_count: u8,
    /// Formal charge.
    pub charge: i8,
    /// Disabled atoms are drawn greyed out and ignored by hit testing.
    pub enabled: bool,
    /// Hidden atoms are not drawn.
    pub hidden: bool,
    /// Derived: where implicit hydrogens go.
    pub hydrogen_side: LabelSide,
    /// Derived: where the substituent label goes.
    pub label_side: LabelSide,
}

impl Atom {
    /// Create an enabled, visible atom.
    pub fn new(id: AtomId, element: impl Into<String>, coordinates: DVec2) -> Self {
        Self {
            id,
            element: element.into(),
            label: None,
            coordinates,
            temp_coordinates: None,
            hydrogen_count: 0,
            charge: 0,
            enabled: true,
            hidden: false,
            hydrogen_side: LabelSide::default(),
            label_side: LabelSide::default(),
        }
    }

    /// Builder: set implicit hydrogen count.
    pub fn with_hydrogens(mut self, count: u8) -> Self {
        self.hydrogen_count = count;
        self
    }

    /// Builder: set charge.
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    /// Position to draw: temporary if a gesture is active, else committed.
    pub fn display_coordinates(&self) -> DVec2 {
        self.temp_coordinates.unwrap_or(self.coordinates)
    }

    /// Recompute `hydrogen_side` and `label_side` from neighbour positions.
    ///
    /// Hydrogens go to the side whose direction overlaps least with any
    /// bond; the label goes opposite the mean bond direction.
    pub fn orient(&mut self, neighbor_positions: &[DVec2]) {
        let bonds: Vec<DVec2> = neighbor_positions
            .iter()
            .map(|p| (*p - self.coordinates).normalize_or_zero())
            .filter(|v| *v != DVec2::ZERO)
            .collect();

        if bonds.is_empty() {
            self.hydrogen_side = LabelSide::Right;
            self.label_side = LabelSide::Right;
            return;
        }

        let mut best = LabelSide::Right;
        let mut best_overlap = f64::INFINITY;
        for side in LabelSide::PREFERENCE {
            let dir = side.direction();
            let overlap = bonds.iter().map(|b| b.dot(dir)).fold(f64::NEG_INFINITY, f64::max);
            // Strictly smaller so ties keep the earlier preference.
            if overlap < best_overlap - 1e-9 {
                best_overlap = overlap;
                best = side;
            }
        }
        self.hydrogen_side = best;

        let mean: DVec2 = bonds.iter().copied().sum::<DVec2>() / bonds.len() as f64;
        self.label_side = if mean.x > 1e-9 { LabelSide::Left } else { LabelSide::Right };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_atom_defaults_right() {
        let mut a = Atom::new(AtomId::new(1), "O", DVec2::ZERO).with_hydrogens(2);
        a.orient(&[]);
        assert_eq!(a.hydrogen_side, LabelSide::Right);
        assert_eq!(a.label_side, LabelSide::Right);
    }

    #[test]
    fn test_bond_to_the_right_pushes_hydrogens_left() {
        let mut a = Atom::new(AtomId::new(1), "N", DVec2::ZERO);
        a.orient(&[DVec2::new(1.0, 0.0)]);
        assert_eq!(a.hydrogen_side, LabelSide::Left);
        assert_eq!(a.label_side, LabelSide::Left);
    }

    #[test]
    fn test_horizontal_bonds_push_hydrogens_vertical() {
        let mut a = Atom::new(AtomId::new(1), "C", DVec2::ZERO);
        a.orient(&[DVec2::new(1.0, 0.2), DVec2::new(-1.0, 0.2)]);
        assert_eq!(a.hydrogen_side, LabelSide::Up);
    }

    #[test]
    fn test_display_coordinates_prefers_temporary() {
        let mut a = Atom::new(AtomId::new(1), "C", DVec2::new(1.0, 1.0));
        assert_eq!(a.display_coordinates(), DVec2::new(1.0, 1.0));
        a.temp_coordinates = Some(DVec2::new(5.0, 5.0));
        assert_eq!(a.display_coordinates(), DVec2::new(5.0, 5.0));
    }
}
