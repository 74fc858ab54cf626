//! Incremental bounding-box maintenance.
//!
//! A [`BoundaryTracker`] keeps the four extrema of a region (one structure,
//! or the whole scene) together with a change marker per axis:
//!
//! | `ChangeDir` | Meaning |
//! |-------------|---------|
//! | `Unchanged` | value still valid, not touched by the last update |
//! | `Extended`  | value replaced by a confirmed new extremum |
//! | `Stale`     | the extremal element moved inward; rescan before trusting |
//!
//! Moving one element costs O(1). Only when the element that defined an
//! extremum moves inward is a full rescan (`calc_boundaries`) needed.

use glam::DVec2;
use std::fmt;

use crate::types::Limits;

/// Change marker of one extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeDir {
    /// The tracked value may be too extreme; a rescan is required.
    Stale,
    /// Nothing happened on this axis.
    Unchanged,
    /// A new extremum was adopted.
    Extended,
}

impl ChangeDir {
    /// Numeric form: -1, 0 or +1.
    pub fn as_i8(&self) -> i8 {
        match self {
            Self::Stale => -1,
            Self::Unchanged => 0,
            Self::Extended => 1,
        }
    }
}

/// The four tracked extrema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Smallest x.
    XMin,
    /// Largest x.
    XMax,
    /// Smallest y.
    YMin,
    /// Largest y.
    YMax,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 4] = [Self::XMin, Self::XMax, Self::YMin, Self::YMax];

    fn index(&self) -> usize {
        match self {
            Self::XMin => 0,
            Self::XMax => 1,
            Self::YMin => 2,
            Self::YMax => 3,
        }
    }

    fn is_min(&self) -> bool {
        matches!(self, Self::XMin | Self::YMin)
    }

    /// The component of `limits` this axis tracks.
    pub fn of(&self, limits: &Limits) -> f64 {
        match self {
            Self::XMin => limits.min.x,
            Self::XMax => limits.max.x,
            Self::YMin => limits.min.y,
            Self::YMax => limits.max.y,
        }
    }

    /// Whether `candidate` is at least as extreme as `current`.
    fn reaches(&self, candidate: f64, current: f64) -> bool {
        if self.is_min() {
            candidate <= current
        } else {
            candidate >= current
        }
    }

    fn empty_value(&self) -> f64 {
        if self.is_min() {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XMin => write!(f, "x_min"),
            Self::XMax => write!(f, "x_max"),
            Self::YMin => write!(f, "y_min"),
            Self::YMax => write!(f, "y_max"),
        }
    }
}

/// A tracked extremum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    /// Current value.
    pub val: f64,
    /// What the last update did to it.
    pub change_dir: ChangeDir,
}

/// Incrementally maintained bounds of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryTracker {
    extrema: [Extremum; 4],
}

impl Default for BoundaryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundaryTracker {
    /// Tracker of an empty region.
    pub fn new() -> Self {
        let mut extrema = [Extremum {
            val: 0.0,
            change_dir: ChangeDir::Unchanged,
        }; 4];
        for axis in Axis::ALL {
            extrema[axis.index()].val = axis.empty_value();
        }
        Self { extrema }
    }

    /// Tracker initialised by a full scan.
    pub fn from_elements<I: IntoIterator<Item = Limits>>(elements: I) -> Self {
        let mut tracker = Self::new();
        tracker.calc_boundaries(elements);
        tracker.reset_change_dirs();
        tracker
    }

    /// One extremum.
    pub fn extremum(&self, axis: Axis) -> Extremum {
        self.extrema[axis.index()]
    }

    /// Whether nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.extremum(Axis::XMin).val > self.extremum(Axis::XMax).val
    }

    /// Tracked bounds, `None` when empty. May be outdated on stale axes.
    pub fn limits(&self) -> Option<Limits> {
        if self.is_empty() {
            return None;
        }
        Some(Limits {
            min: DVec2::new(self.extremum(Axis::XMin).val, self.extremum(Axis::YMin).val),
            max: DVec2::new(self.extremum(Axis::XMax).val, self.extremum(Axis::YMax).val),
        })
    }

    /// Whether any axis needs a rescan.
    pub fn needs_rescan(&self) -> bool {
        self.extrema.iter().any(|e| e.change_dir == ChangeDir::Stale)
    }

    /// Axes currently marked stale.
    pub fn stale_axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|a| self.extremum(*a).change_dir == ChangeDir::Stale)
            .collect()
    }

    /// Whether any axis changed since the last reset.
    pub fn has_changes(&self) -> bool {
        self.extrema.iter().any(|e| e.change_dir != ChangeDir::Unchanged)
    }

    /// Clear all change markers.
    pub fn reset_change_dirs(&mut self) {
        for e in &mut self.extrema {
            e.change_dir = ChangeDir::Unchanged;
        }
    }

    /// Incremental update for an element whose extent went from `old` to
    /// `new`.
    ///
    /// Per axis: a new value at least as extreme as the tracked one is
    /// adopted (`Extended`). Otherwise, if the old value *was* the tracked
    /// extremum, the axis becomes `Stale`.
    pub fn set_maxes(&mut self, old: &Limits, new: &Limits) {
        for axis in Axis::ALL {
            let e = &mut self.extrema[axis.index()];
            let candidate = axis.of(new);
            if axis.reaches(candidate, e.val) {
                e.val = candidate;
                e.change_dir = ChangeDir::Extended;
            } else if axis.of(old) == e.val {
                e.change_dir = ChangeDir::Stale;
            }
        }
        tracing::trace!(
            stale = self.needs_rescan(),
            dirs = ?Axis::ALL.map(|axis| self.extremum(axis).change_dir.as_i8()),
            "Boundary incremental update"
        );
    }

    /// Incremental update for a newly inserted element. Never marks an
    /// axis stale.
    pub fn set_maxes_add(&mut self, new: &Limits) {
        for axis in Axis::ALL {
            let e = &mut self.extrema[axis.index()];
            let candidate = axis.of(new);
            if axis.reaches(candidate, e.val) {
                e.val = candidate;
                e.change_dir = ChangeDir::Extended;
            }
        }
    }

    /// Full rescan over all element extents.
    ///
    /// Axes whose value changed are marked `Extended`, the rest
    /// `Unchanged`.
    pub fn calc_boundaries<I: IntoIterator<Item = Limits>>(&mut self, elements: I) {
        let mut fresh = [0.0; 4];
        for axis in Axis::ALL {
            fresh[axis.index()] = axis.empty_value();
        }
        for limits in elements {
            for axis in Axis::ALL {
                let v = axis.of(&limits);
                if axis.reaches(v, fresh[axis.index()]) {
                    fresh[axis.index()] = v;
                }
            }
        }
        for axis in Axis::ALL {
            let e = &mut self.extrema[axis.index()];
            let v = fresh[axis.index()];
            e.change_dir = if v == e.val {
                ChangeDir::Unchanged
            } else {
                ChangeDir::Extended
            };
            e.val = v;
        }
    }
}

/// Sub-bounds a caller already knows to be current.
///
/// During a scene rescan, element kinds with a fixed value are taken as-is
/// and only the remaining kinds are rescanned. A kind counts as fixed when
/// the triggering edit did not touch any of its elements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedLimits {
    /// Union of all structure bounds.
    pub structures: Option<Limits>,
    /// Union of all spline curve bounds.
    pub hydrophobic_contacts: Option<Limits>,
    /// Union of all annotation draw bounds.
    pub annotations: Option<Limits>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Limits {
        Limits::from_point(DVec2::new(x, y))
    }

    fn tracker() -> BoundaryTracker {
        BoundaryTracker::from_elements([pt(0.0, 0.0), pt(10.0, 5.0), pt(4.0, -3.0)])
    }

    #[test]
    fn test_empty_tracker() {
        let t = BoundaryTracker::new();
        assert!(t.is_empty());
        assert!(t.limits().is_none());
    }

    #[test]
    fn test_from_elements() {
        let l = tracker().limits().unwrap();
        assert_eq!(l.min, DVec2::new(0.0, -3.0));
        assert_eq!(l.max, DVec2::new(10.0, 5.0));
        assert!(!tracker().has_changes());
    }

    #[test]
    fn test_outward_move_extends() {
        let mut t = tracker();
        t.set_maxes(&pt(10.0, 5.0), &pt(12.0, 5.0));
        assert_eq!(t.extremum(Axis::XMax).val, 12.0);
        assert_eq!(t.extremum(Axis::XMax).change_dir, ChangeDir::Extended);
        assert!(!t.needs_rescan());
    }

    #[test]
    fn test_extremal_element_moving_inward_goes_stale() {
        let mut t = tracker();
        t.set_maxes(&pt(10.0, 5.0), &pt(8.0, 5.0));
        assert_eq!(t.extremum(Axis::XMax).change_dir, ChangeDir::Stale);
        // y_max: 5.0 -> 5.0 is "at least as extreme", stays valid.
        assert_eq!(t.extremum(Axis::YMax).change_dir, ChangeDir::Extended);
        assert_eq!(t.stale_axes(), vec![Axis::XMax]);

        t.calc_boundaries([pt(0.0, 0.0), pt(8.0, 5.0), pt(4.0, -3.0)]);
        assert!(!t.needs_rescan());
        assert_eq!(t.extremum(Axis::XMax).val, 8.0);
    }

    #[test]
    fn test_interior_move_leaves_axes_untouched() {
        let mut t = tracker();
        t.set_maxes(&pt(4.0, -3.0), &pt(5.0, -3.0));
        assert_eq!(t.extremum(Axis::XMin).change_dir, ChangeDir::Unchanged);
        assert_eq!(t.extremum(Axis::XMax).change_dir, ChangeDir::Unchanged);
    }

    #[test]
    fn test_add_never_goes_stale() {
        let mut t = tracker();
        t.set_maxes_add(&pt(3.0, 3.0));
        assert!(!t.needs_rescan());
        assert!(!t.has_changes());
        t.set_maxes_add(&pt(-1.0, 3.0));
        assert_eq!(t.extremum(Axis::XMin).val, -1.0);
        assert_eq!(t.extremum(Axis::XMin).change_dir.as_i8(), 1);
    }
}
