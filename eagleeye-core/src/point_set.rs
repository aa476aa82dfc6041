//! The immutable point set shared between the loader and the scene

use crate::geometry::BoundingBox;
use crate::point::CloudPoint;
use std::ops::Index;
use std::sync::Arc;

/// An ordered, immutable collection of points making up one loaded cloud.
///
/// Cloning is cheap: the points live behind an `Arc` so the loader, the scene
/// and an in-flight export can all hold the same cloud. A new load replaces
/// the whole set; there is no in-place mutation.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Arc<[CloudPoint]>,
}

impl PointSet {
    /// Create an empty point set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a point set from a vector of points, keeping their order
    pub fn from_points(points: Vec<CloudPoint>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Get the number of points in the set
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, CloudPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[CloudPoint] {
        &self.points
    }

    /// Axis-aligned bounds of the set; degenerate when the set is empty.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Whether two handles refer to the same underlying allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.points, &other.points)
    }
}

impl PartialEq for PointSet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.points == other.points
    }
}

impl Index<usize> for PointSet {
    type Output = CloudPoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a CloudPoint;
    type IntoIter = std::slice::Iter<'a, CloudPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl FromIterator<CloudPoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = CloudPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<CloudPoint>> for PointSet {
    fn from(points: Vec<CloudPoint>) -> Self {
        Self::from_points(points)
    }
}
