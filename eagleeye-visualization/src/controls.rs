//! Damped orbit camera controls
//!
//! The camera orbits `target` on a sphere. Input accumulates rotation, zoom
//! and pan deltas; every [`OrbitControls::update`] applies a fraction of the
//! pending delta (the damping factor) and decays the rest, so motion eases out
//! over several frames instead of snapping.

use crate::camera::Camera;
use eagleeye_core::{Point3d, Vector3d, ViewerConfig};
use std::f64::consts::PI;

/// Keeps the polar angle away from the poles, where the view basis degenerates
const POLAR_EPSILON: f64 = 1e-6;

/// Spherical coordinates around +Y: `theta` is the azimuth measured from +Z
/// towards +X, `phi` the polar angle from +Y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spherical {
    pub radius: f64,
    pub theta: f64,
    pub phi: f64,
}

impl Spherical {
    pub fn from_vector(v: &Vector3d) -> Self {
        let radius = v.norm();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_vector(&self) -> Vector3d {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3d::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit controller state. Bounds and speeds come from [`ViewerConfig`].
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Input is ignored while disabled; pending motion still settles.
    pub enabled: bool,
    pub target: Point3d,
    pub damping: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_polar_angle: f64,
    pub max_polar_angle: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    pub pan_speed: f64,
    spherical_delta: Spherical,
    pan_offset: Vector3d,
    scale: f64,
}

impl OrbitControls {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            enabled: true,
            target: Point3d::origin(),
            damping: config.damping,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            spherical_delta: Spherical::default(),
            pan_offset: Vector3d::zeros(),
            scale: 1.0,
        }
    }

    fn zoom_scale(&self) -> f64 {
        0.95_f64.powf(self.zoom_speed)
    }

    pub fn rotate_left(&mut self, angle: f64) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f64) {
        self.spherical_delta.phi -= angle;
    }

    /// Rotate by a pointer drag of `(dx, dy)` pixels on a surface `height` pixels tall.
    pub fn rotate_by_pixels(&mut self, dx: f64, dy: f64, height: f64) {
        if !self.enabled || height <= 0.0 {
            return;
        }
        let dx = dx * self.rotate_speed;
        let dy = dy * self.rotate_speed;
        self.rotate_left(2.0 * PI * dx / height);
        self.rotate_up(2.0 * PI * dy / height);
    }

    /// Pan by a pointer drag in screen space. The world distance covered by
    /// one pixel grows with the distance to the target.
    pub fn pan_by_pixels(&mut self, camera: &Camera, dx: f64, dy: f64, height: f64) {
        if !self.enabled || height <= 0.0 {
            return;
        }
        let dx = dx * self.pan_speed;
        let dy = dy * self.pan_speed;
        let offset = camera.position - self.target;
        let target_distance = offset.norm() * (camera.fov_radians() / 2.0).tan();

        let left = 2.0 * dx * target_distance / height;
        let up = 2.0 * dy * target_distance / height;
        self.pan_offset += camera.right() * -left;
        self.pan_offset += camera.camera_up() * up;
    }

    /// Zoom by wheel notches; positive values move towards the target.
    pub fn zoom_by_wheel(&mut self, notches: f64) {
        if !self.enabled || notches == 0.0 {
            return;
        }
        let step = self.zoom_scale().powf(notches.abs());
        if notches > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    /// Advance one frame: apply the damped share of pending input, move the
    /// camera and aim it at the target.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_vector(&offset);

        let factor = if self.damping > 0.0 { self.damping } else { 1.0 };
        spherical.theta += self.spherical_delta.theta * factor;
        spherical.phi += self.spherical_delta.phi * factor;

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * factor;

        camera.position = self.target + spherical.to_vector();
        camera.look_at(self.target);

        if self.damping > 0.0 {
            let keep = 1.0 - self.damping;
            self.spherical_delta.theta *= keep;
            self.spherical_delta.phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3d::zeros();
        }
        self.scale = 1.0;
    }

    /// Forget any motion still settling from earlier input.
    pub fn stop(&mut self) {
        self.spherical_delta = Spherical::default();
        self.pan_offset = Vector3d::zeros();
        self.scale = 1.0;
    }

    pub fn is_settling(&self) -> bool {
        self.spherical_delta.theta.abs() > 1e-9
            || self.spherical_delta.phi.abs() > 1e-9
            || self.pan_offset.norm() > 1e-9
    }
}
