//! Mutable viewer parameters set by the control layer

use crate::color::{ColorMode, parse_hex_color, to_hex_color};
use serde::{Deserialize, Serialize};

pub const MIN_POINT_SIZE: f32 = 0.01;
pub const MAX_POINT_SIZE: f32 = 0.10;
pub const DEFAULT_POINT_SIZE: f32 = 0.05;
/// Step used by the keyboard point-size controls
pub const POINT_SIZE_STEP: f32 = 0.01;

/// Per-viewer parameters that external controls mutate and the scene reads.
///
/// The scene rebuilds its renderable when `point_size`, `color_mode` or
/// `uniform_color` change; `is_animating` only affects the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerParameters {
    point_size: f32,
    pub color_mode: ColorMode,
    pub uniform_color: [u8; 3],
    pub is_animating: bool,
}

impl ViewerParameters {
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Set the point size, clamped to `[MIN_POINT_SIZE, MAX_POINT_SIZE]`.
    /// Non-finite input is ignored.
    pub fn set_point_size(&mut self, size: f32) {
        if size.is_finite() {
            self.point_size = size.clamp(MIN_POINT_SIZE, MAX_POINT_SIZE);
        }
    }

    pub fn step_point_size(&mut self, steps: i32) {
        self.set_point_size(self.point_size + steps as f32 * POINT_SIZE_STEP);
    }

    /// Set the uniform colour from a `#rrggbb` string. Returns false and keeps
    /// the current colour when the string is not a valid hex colour.
    pub fn set_uniform_color_hex(&mut self, hex: &str) -> bool {
        match parse_hex_color(hex) {
            Some(c) => {
                self.uniform_color = c;
                true
            }
            None => false,
        }
    }

    pub fn uniform_color_hex(&self) -> String {
        to_hex_color(self.uniform_color)
    }

    pub fn toggle_animation(&mut self) -> bool {
        self.is_animating = !self.is_animating;
        self.is_animating
    }

    /// The subset of parameters that shape the renderable object.
    pub fn appearance(&self) -> Appearance {
        Appearance {
            point_size: self.point_size,
            color_mode: self.color_mode,
            uniform_color: self.uniform_color,
        }
    }
}

impl Default for ViewerParameters {
    fn default() -> Self {
        Self {
            point_size: DEFAULT_POINT_SIZE,
            color_mode: ColorMode::Original,
            uniform_color: [255, 255, 255],
            is_animating: false,
        }
    }
}

/// Parameters whose change forces a rebuild of the renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub point_size: f32,
    pub color_mode: ColorMode,
    pub uniform_color: [u8; 3],
}
