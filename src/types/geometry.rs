//! 2D geometry helpers shared by the store and the boundary tracker.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in scene coordinates.
///
/// Scene coordinates follow screen convention: `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Smallest x and y covered.
    pub min: DVec2,
    /// Largest x and y covered.
    pub max: DVec2,
}

impl Limits {
    /// Degenerate rectangle covering one point.
    pub fn from_point(p: DVec2) -> Self {
        Self { min: p, max: p }
    }

    /// Rectangle centred on `center` extending `half` in each direction.
    pub fn around(center: DVec2, half: DVec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest rectangle covering all points, `None` if there are none.
    pub fn from_points<I: IntoIterator<Item = DVec2>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self::from_point(p)),
            Some(l) => Some(l.including(p)),
        })
    }

    /// This rectangle grown to cover `p`.
    pub fn including(&self, p: DVec2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Limits) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow by `radius` on every side.
    pub fn inflate(&self, radius: f64) -> Self {
        let r = DVec2::splat(radius);
        Self {
            min: self.min - r,
            max: self.max + r,
        }
    }

    /// Centre point.
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

/// Sample a uniform Catmull-Rom curve through `points`.
///
/// The curve passes through every control point; end segments reuse the
/// end points as phantom neighbours.
pub fn sample_catmull_rom(points: &[DVec2], samples_per_segment: usize) -> Vec<DVec2> {
    match points.len() {
        0 => return Vec::new(),
        1 => return vec![points[0]],
        _ => {}
    }
    let samples = samples_per_segment.max(1);
    let mut out = Vec::with_capacity((points.len() - 1) * samples + 1);
    for i in 0..points.len() - 1 {
        let p0 = if i == 0 { points[0] } else { points[i - 1] };
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = if i + 2 >= points.len() { p2 } else { points[i + 2] };
        for s in 0..samples {
            let t = s as f64 / samples as f64;
            out.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }
    out.push(points[points.len() - 1]);
    out
}

fn catmull_rom(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let t2 = t * t;
    let t3 = t2 * t;

    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;

    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}

/// Bounds of the rendered curve through `points`, grown by the stroke radius.
pub fn curve_limits(points: &[DVec2], samples_per_segment: usize, stroke_radius: f64) -> Option<Limits> {
    Limits::from_points(sample_catmull_rom(points, samples_per_segment)).map(|l| l.inflate(stroke_radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_inflate() {
        let a = Limits::from_point(DVec2::new(0.0, 0.0));
        let b = Limits::from_point(DVec2::new(4.0, -2.0));
        let u = a.union(&b);
        assert_eq!(u.min, DVec2::new(0.0, -2.0));
        assert_eq!(u.max, DVec2::new(4.0, 0.0));
        let i = u.inflate(1.0);
        assert_eq!(i.min, DVec2::new(-1.0, -3.0));
        assert_eq!(i.max, DVec2::new(5.0, 1.0));
    }

    #[test]
    fn test_from_points_empty() {
        assert!(Limits::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_curve_passes_through_control_points() {
        let pts = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 5.0), DVec2::new(20.0, 0.0)];
        let samples = sample_catmull_rom(&pts, 4);
        assert_eq!(samples.len(), 9);
        assert_eq!(samples[0], pts[0]);
        assert!((samples[4] - pts[1]).length() < 1e-9);
        assert_eq!(*samples.last().unwrap(), pts[2]);
    }

    #[test]
    fn test_curve_limits_include_stroke() {
        let pts = vec![DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)];
        let l = curve_limits(&pts, 8, 2.0).unwrap();
        assert_eq!(l.min, DVec2::new(-2.0, -2.0));
        assert_eq!(l.max, DVec2::new(12.0, 2.0));
    }
}
