//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Colour assigned to points whose source carries no colour channels.
pub const DEFAULT_POINT_COLOR: [u8; 3] = [255, 255, 255];

/// A loaded point: position in the source's native units plus an 8-bit RGB colour.
///
/// Points are never modified after parsing; normalisation and colour mapping
/// produce new values instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudPoint {
    pub position: Point3d,
    pub color: [u8; 3],
}

impl CloudPoint {
    /// Create a white point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::with_color(x, y, z, DEFAULT_POINT_COLOR)
    }

    /// Create a point with an explicit colour
    pub fn with_color(x: f64, y: f64, z: f64, color: [u8; 3]) -> Self {
        Self {
            position: Point3d::new(x, y, z),
            color,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Whether all three coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }
}

impl Default for CloudPoint {
    fn default() -> Self {
        Self {
            position: Point3d::origin(),
            color: DEFAULT_POINT_COLOR,
        }
    }
}

/// Round a colour channel read from text to the nearest byte.
///
/// Non-finite input yields `None`; finite values are clamped to `[0, 255]`.
pub fn channel_from_f64(value: f64) -> Option<u8> {
    if value.is_finite() {
        Some(value.round().clamp(0.0, 255.0) as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_point_is_white_origin() {
        let p = CloudPoint::default();
        assert_eq!(p.position, Point3d::origin());
        assert_eq!(p.color, [255, 255, 255]);
    }

    #[test]
    fn test_channel_rounding() {
        assert_eq!(channel_from_f64(127.5), Some(128));
        assert_eq!(channel_from_f64(12.4), Some(12));
        assert_eq!(channel_from_f64(-3.0), Some(0));
        assert_eq!(channel_from_f64(300.0), Some(255));
        assert_eq!(channel_from_f64(f64::NAN), None);
    }

    #[test]
    fn test_is_finite() {
        assert!(CloudPoint::new(1.0, 2.0, 3.0).is_finite());
        assert!(!CloudPoint::new(f64::INFINITY, 0.0, 0.0).is_finite());
    }
}
