//! Bounding boxes and scale/centre normalisation

use crate::point::{CloudPoint, Point3d, Vector3d};
use serde::{Deserialize, Serialize};

/// Radius, in scene units, that a normalised cloud is scaled to fill.
pub const DEFAULT_TARGET_RADIUS: f64 = 50.0;

/// Axis-aligned bounding box.
///
/// An empty box has `min = +inf` and `max = -inf` on every axis; callers must
/// check [`BoundingBox::is_empty`] before using centre or size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// The degenerate box that every `extend` shrinks into shape.
    pub fn empty() -> Self {
        Self {
            min: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Single pass per-axis min/max over the point positions.
    pub fn from_points(points: &[CloudPoint]) -> Self {
        Self::from_positions(points.iter().map(|p| p.position))
    }

    pub fn from_positions<I: IntoIterator<Item = Point3d>>(positions: I) -> Self {
        let mut bbox = Self::empty();
        for p in positions {
            bbox.extend(&p);
        }
        bbox
    }

    /// Grow the box to contain `p`
    pub fn extend(&mut self, p: &Point3d) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);

        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Midpoint per axis
    pub fn center(&self) -> Point3d {
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent per axis
    pub fn size(&self) -> Vector3d {
        self.max - self.min
    }

    /// Largest of the three extents
    pub fn max_extent(&self) -> f64 {
        self.size().max()
    }

    /// The eight corner points.
    pub fn corners(&self) -> [Point3d; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3d::new(lo.x, lo.y, lo.z),
            Point3d::new(hi.x, lo.y, lo.z),
            Point3d::new(lo.x, hi.y, lo.z),
            Point3d::new(hi.x, hi.y, lo.z),
            Point3d::new(lo.x, lo.y, hi.z),
            Point3d::new(hi.x, lo.y, hi.z),
            Point3d::new(lo.x, hi.y, hi.z),
            Point3d::new(hi.x, hi.y, hi.z),
        ]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Compute the bounding box of a point list.
pub fn bounding_box(points: &[CloudPoint]) -> BoundingBox {
    BoundingBox::from_points(points)
}

/// Result of centring and uniformly scaling a point list.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    /// `(p - center) * scale` for every input point, in input order
    pub points: Vec<Point3d>,
    pub scale: f64,
    pub center: Point3d,
}

impl Normalization {
    /// Map a single source position into normalised space.
    pub fn apply(&self, p: &Point3d) -> Point3d {
        Point3d::from((p - self.center) * self.scale)
    }
}

/// Centre `points` on the midpoint of `bbox` and scale them so the farthest
/// point lies `target_radius` from the centre.
///
/// When every point coincides with the centre the scale is `1`.
pub fn normalize(points: &[CloudPoint], bbox: &BoundingBox, target_radius: f64) -> Normalization {
    if points.is_empty() || bbox.is_empty() {
        return Normalization {
            points: Vec::new(),
            scale: 1.0,
            center: Point3d::origin(),
        };
    }

    let center = bbox.center();
    let max_radius = points
        .iter()
        .map(|p| (p.position - center).norm())
        .fold(0.0_f64, f64::max);

    let scale = if max_radius > 0.0 {
        target_radius / max_radius
    } else {
        1.0
    };

    let points = points
        .iter()
        .map(|p| Point3d::from((p.position - center) * scale))
        .collect();

    Normalization {
        points,
        scale,
        center,
    }
}
