//! Free-standing labels and hydrophobic contact splines.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::geometry::{curve_limits, Limits};
use super::ids::{AnnotationId, AtomId, ControlPointId, HydrophobicId, StructureId};

/// A text label placed in the scene.
///
/// An annotation may belong to a structure (structure-level attachment,
/// e.g. a residue name) and may additionally link to atoms of that
/// structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique annotation identifier.
    pub id: AnnotationId,
    /// Label text.
    pub label: String,
    /// Committed centre position.
    pub coordinates: DVec2,
    /// In-progress position during a drag.
    pub temp_coordinates: Option<DVec2>,
    /// Drawn text box size.
    pub size: DVec2,
    /// Owning structure, if any.
    pub belongs_to: Option<StructureId>,
    /// Linked atoms (all in `belongs_to`).
    pub atom_links: BTreeSet<AtomId>,
}

impl Annotation {
    /// Create an unattached annotation.
    pub fn new(id: AnnotationId, label: impl Into<String>, coordinates: DVec2, size: DVec2) -> Self {
        Self {
            id,
            label: label.into(),
            coordinates,
            temp_coordinates: None,
            size,
            belongs_to: None,
            atom_links: BTreeSet::new(),
        }
    }

    /// Builder: attach to a structure and link atoms.
    pub fn attached(mut self, structure: StructureId, atoms: impl IntoIterator<Item = AtomId>) -> Self {
        self.belongs_to = Some(structure);
        self.atom_links = atoms.into_iter().collect();
        self
    }

    /// Bounds of the drawn text box at the committed position.
    pub fn draw_limits(&self) -> Limits {
        Limits::around(self.coordinates, self.size * 0.5)
    }
}

/// A control point of a hydrophobic contact spline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Identifier, unique within the spline.
    pub id: ControlPointId,
    /// Committed position.
    pub coordinates: DVec2,
    /// In-progress position during a drag.
    pub temp_coordinates: Option<DVec2>,
    /// Atoms this control point follows.
    pub atom_links: BTreeSet<AtomId>,
}

impl ControlPoint {
    /// Create an unlinked control point.
    pub fn new(id: ControlPointId, coordinates: DVec2) -> Self {
        Self {
            id,
            coordinates,
            temp_coordinates: None,
            atom_links: BTreeSet::new(),
        }
    }

    /// Builder: link atoms.
    pub fn linked(mut self, atoms: impl IntoIterator<Item = AtomId>) -> Self {
        self.atom_links = atoms.into_iter().collect();
        self
    }
}

/// Hydrophobic contact drawn as a smooth curve through its control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrophobicContact {
    /// Unique spline identifier.
    pub id: HydrophobicId,
    /// Structure the contact is drawn for.
    pub belongs_to: StructureId,
    /// Control points in curve order.
    pub control_points: Vec<ControlPoint>,
}

impl HydrophobicContact {
    /// Create a spline.
    pub fn new(id: HydrophobicId, belongs_to: StructureId, control_points: Vec<ControlPoint>) -> Self {
        Self {
            id,
            belongs_to,
            control_points,
        }
    }

    /// Look up a control point.
    pub fn control_point(&self, id: ControlPointId) -> Option<&ControlPoint> {
        self.control_points.iter().find(|cp| cp.id == id)
    }

    /// Mutable control point lookup.
    pub fn control_point_mut(&mut self, id: ControlPointId) -> Option<&mut ControlPoint> {
        self.control_points.iter_mut().find(|cp| cp.id == id)
    }

    /// Every atom any control point links to.
    pub fn linked_atoms(&self) -> BTreeSet<AtomId> {
        self.control_points.iter().flat_map(|cp| cp.atom_links.iter().copied()).collect()
    }

    /// Bounds of the rendered curve, grown by the stroke radius.
    pub fn curve_limits(&self, samples_per_segment: usize, stroke_radius: f64) -> Option<Limits> {
        let points: Vec<DVec2> = self.control_points.iter().map(|cp| cp.coordinates).collect();
        curve_limits(&points, samples_per_segment, stroke_radius)
    }
}
