//! Viewer configuration loaded once at startup

use crate::color::{bytes_to_rgb, parse_hex_color, Rgb};
use crate::error::{Error, Result};
use crate::geometry::DEFAULT_TARGET_RADIUS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static viewer settings. Every field has a default, so a config file only
/// needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Radius the loaded cloud is scaled to fill
    pub target_radius: f64,
    /// Camera distance after a reset, as a multiple of the object's largest extent
    pub reset_distance_factor: f64,
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    pub initial_camera_position: [f64; 3],
    pub damping: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub pan_speed: f64,
    /// Radians added to the object's y rotation per frame while animating
    pub rotation_step: f64,
    /// Length of the axes marker; zero hides it
    pub axis_length: f64,
    pub background: String,
    pub window_width: u32,
    pub window_height: u32,
    pub export_base_name: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            target_radius: DEFAULT_TARGET_RADIUS,
            reset_distance_factor: 2.0,
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_camera_position: [0.0, 0.0, 5.0],
            damping: 0.1,
            min_distance: 1.0,
            max_distance: 10000.0,
            rotate_speed: 1.0,
            zoom_speed: 1.2,
            pan_speed: 1.0,
            rotation_step: 0.01,
            axis_length: 50.0,
            background: "#1a1a2e".to_string(),
            window_width: 1280,
            window_height: 800,
            export_base_name: "pointcloud".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the camera and controls cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.target_radius > 0.0) {
            return Err(Error::InvalidData(format!(
                "target_radius must be positive, got {}",
                self.target_radius
            )));
        }
        if !(self.fov_deg > 0.0 && self.fov_deg < 180.0) {
            return Err(Error::InvalidData(format!(
                "fov_deg must be in (0, 180), got {}",
                self.fov_deg
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(Error::InvalidData(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.min_distance > 0.0 && self.max_distance >= self.min_distance) {
            return Err(Error::InvalidData(format!(
                "orbit distances must satisfy 0 < min <= max, got min={} max={}",
                self.min_distance, self.max_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(Error::InvalidData(format!(
                "damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        if parse_hex_color(&self.background).is_none() {
            return Err(Error::InvalidData(format!(
                "background is not a #rrggbb colour: {}",
                self.background
            )));
        }
        if self.export_base_name.trim().is_empty() {
            return Err(Error::InvalidData("export_base_name is empty".to_string()));
        }
        Ok(())
    }

    /// Clear colour as linear channels in `[0, 1]`. Falls back to black when
    /// the configured string does not parse.
    pub fn background_rgb(&self) -> Rgb {
        bytes_to_rgb(parse_hex_color(&self.background).unwrap_or([0, 0, 0]))
    }

    pub fn fov_radians(&self) -> f64 {
        self.fov_deg.to_radians()
    }
}
