//! Per-point display colour strategies

use crate::geometry::BoundingBox;
use crate::point::CloudPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear RGB with each channel in `[0, 1]`
pub type Rgb = [f32; 3];

pub const WHITE: Rgb = [1.0, 1.0, 1.0];

/// Strategy used to colour every point of the rendered cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColorMode {
    /// The point's own colour
    #[default]
    Original,
    /// Hue sweep from blue (lowest y) to red (highest y)
    Height,
    /// Hue sweep by distance from the source origin
    Distance,
    /// One user-chosen colour for every point
    Uniform,
    /// Any mode name the viewer does not recognise; paints every point white.
    Fallback,
}

impl ColorMode {
    /// The four selectable modes, in control-widget order.
    pub const SELECTABLE: [ColorMode; 4] = [
        ColorMode::Original,
        ColorMode::Height,
        ColorMode::Distance,
        ColorMode::Uniform,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Original => "original",
            ColorMode::Height => "height",
            ColorMode::Distance => "distance",
            ColorMode::Uniform => "uniform",
            ColorMode::Fallback => "fallback",
        }
    }

    /// The selectable mode after this one, wrapping around.
    pub fn next(&self) -> ColorMode {
        let idx = Self::SELECTABLE
            .iter()
            .position(|m| m == self)
            .map_or(0, |i| (i + 1) % Self::SELECTABLE.len());
        Self::SELECTABLE[idx]
    }
}

impl From<&str> for ColorMode {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "original" => ColorMode::Original,
            "height" => ColorMode::Height,
            "distance" => ColorMode::Distance,
            "uniform" => ColorMode::Uniform,
            _ => ColorMode::Fallback,
        }
    }
}

impl From<String> for ColorMode {
    fn from(name: String) -> Self {
        ColorMode::from(name.as_str())
    }
}

impl From<ColorMode> for String {
    fn from(mode: ColorMode) -> Self {
        mode.name().to_string()
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the display colour of `point` under `mode`.
///
/// `bbox` is the bounding box of the untransformed source cloud; `height`
/// and `distance` modes read it, the others ignore it.
pub fn color_for(point: &CloudPoint, bbox: &BoundingBox, mode: ColorMode, uniform: [u8; 3]) -> Rgb {
    match mode {
        ColorMode::Original => bytes_to_rgb(point.color),
        ColorMode::Height => {
            let span = bbox.max.y - bbox.min.y;
            let span = if span != 0.0 { span } else { 1.0 };
            let ratio = (point.y() - bbox.min.y) / span;
            hsl_to_rgb(0.7 * (1.0 - ratio), 1.0, 0.5)
        }
        ColorMode::Distance => {
            let d = point.position.coords.norm();
            let max_d = bbox.max.coords.norm();
            let max_d = if max_d != 0.0 { max_d } else { 1.0 };
            hsl_to_rgb(0.3 * (1.0 - d / max_d), 1.0, 0.5)
        }
        ColorMode::Uniform => bytes_to_rgb(uniform),
        ColorMode::Fallback => WHITE,
    }
}

/// Scale 8-bit channels into `[0, 1]`.
pub fn bytes_to_rgb(c: [u8; 3]) -> Rgb {
    [
        c[0] as f32 / 255.0,
        c[1] as f32 / 255.0,
        c[2] as f32 / 255.0,
    ]
}

/// Standard HSL to RGB conversion. Hue wraps, saturation and lightness are clamped.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l as f32; 3];
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0) as f32,
        hue_to_channel(p, q, h) as f32,
        hue_to_channel(p, q, h - 1.0 / 3.0) as f32,
    ]
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Parse `#rrggbb` (leading `#` optional) into 8-bit channels.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Format 8-bit channels as `#rrggbb`.
pub fn to_hex_color(c: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_rgb_eq(a: Rgb, b: Rgb) {
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_hsl_primaries() {
        assert_rgb_eq(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]);
        assert_rgb_eq(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0]);
        assert_rgb_eq(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0]);
        assert_rgb_eq(hsl_to_rgb(0.0, 0.0, 0.25), [0.25, 0.25, 0.25]);
        assert_rgb_eq(hsl_to_rgb(1.0, 1.0, 0.5), hsl_to_rgb(0.0, 1.0, 0.5));
    }

    #[test]
    fn test_original_mode_scales_bytes() {
        let p = CloudPoint::with_color(0.0, 0.0, 0.0, [255, 0, 51]);
        let c = color_for(&p, &BoundingBox::empty(), ColorMode::Original, [0, 0, 0]);
        assert_rgb_eq(c, [1.0, 0.0, 0.2]);
    }

    #[test]
    fn test_height_mode_extremes() {
        let points = vec![CloudPoint::new(0.0, 0.0, 0.0), CloudPoint::new(0.0, 10.0, 0.0)];
        let bbox = BoundingBox::from_points(&points);
        let low = color_for(&points[0], &bbox, ColorMode::Height, [0; 3]);
        let high = color_for(&points[1], &bbox, ColorMode::Height, [0; 3]);
        assert_rgb_eq(low, hsl_to_rgb(0.7, 1.0, 0.5));
        assert_rgb_eq(high, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_height_mode_flat_cloud_is_single_hue() {
        let points: Vec<CloudPoint> = (0..5)
            .map(|i| CloudPoint::new(i as f64, 2.0, -(i as f64)))
            .collect();
        let bbox = BoundingBox::from_points(&points);
        let first = color_for(&points[0], &bbox, ColorMode::Height, [0; 3]);
        for p in &points {
            let c = color_for(p, &bbox, ColorMode::Height, [0; 3]);
            assert!(c.iter().all(|v| v.is_finite()));
            assert_rgb_eq(c, first);
        }
    }

    #[test]
    fn test_distance_mode_uses_bbox_max_corner() {
        let points = vec![CloudPoint::new(0.0, 0.0, 0.0), CloudPoint::new(3.0, 4.0, 0.0)];
        let bbox = BoundingBox::from_points(&points);
        let near = color_for(&points[0], &bbox, ColorMode::Distance, [0; 3]);
        let far = color_for(&points[1], &bbox, ColorMode::Distance, [0; 3]);
        assert_rgb_eq(near, hsl_to_rgb(0.3, 1.0, 0.5));
        assert_rgb_eq(far, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_distance_mode_zero_corner_does_not_divide_by_zero() {
        let points = vec![CloudPoint::new(0.0, 0.0, 0.0)];
        let bbox = BoundingBox::from_points(&points);
        let c = color_for(&points[0], &bbox, ColorMode::Distance, [0; 3]);
        assert!(c.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_uniform_and_fallback() {
        let p = CloudPoint::with_color(1.0, 2.0, 3.0, [1, 2, 3]);
        let bbox = BoundingBox::from_points(&[p]);
        assert_rgb_eq(color_for(&p, &bbox, ColorMode::Uniform, [0, 255, 0]), [0.0, 1.0, 0.0]);
        assert_rgb_eq(color_for(&p, &bbox, ColorMode::Fallback, [0, 255, 0]), WHITE);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(ColorMode::from("height"), ColorMode::Height);
        assert_eq!(ColorMode::from(" Uniform "), ColorMode::Uniform);
        assert_eq!(ColorMode::from("rainbow"), ColorMode::Fallback);

        let parsed: ColorMode = serde_json::from_str("\"distance\"").unwrap();
        assert_eq!(parsed, ColorMode::Distance);
        let unknown: ColorMode = serde_json::from_str("\"sepia\"").unwrap();
        assert_eq!(unknown, ColorMode::Fallback);
    }

    #[test]
    fn test_mode_cycle() {
        assert_eq!(ColorMode::Original.next(), ColorMode::Height);
        assert_eq!(ColorMode::Uniform.next(), ColorMode::Original);
        assert_eq!(ColorMode::Fallback.next(), ColorMode::Original);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#ffffff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("1a1a2e"), Some([0x1a, 0x1a, 0x2e]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(to_hex_color([0x1a, 0x1a, 0x2e]), "#1a1a2e");
    }
}
