//! Perspective camera

use eagleeye_core::{Point3d, Vector3d};
use nalgebra::{Matrix4, Perspective3};

/// Maps OpenGL clip depth `[-1, 1]` onto wgpu's `[0, 1]`
#[rustfmt::skip]
pub fn opengl_to_wgpu_matrix() -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// A perspective camera looking at `target` with a fixed world up of +Y.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3d,
    pub target: Point3d,
    pub up: Vector3d,
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    pub fn new(position: Point3d, fov_deg: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target: Point3d::origin(),
            up: Vector3d::y(),
            fov_deg,
            aspect,
            near,
            far,
        }
    }

    pub fn fov_radians(&self) -> f64 {
        self.fov_deg.to_radians()
    }

    /// Aim the camera at `target` without moving it.
    pub fn look_at(&mut self, target: Point3d) {
        self.target = target;
    }

    /// Recompute the aspect ratio for a surface of `width` x `height` pixels.
    /// The field of view is left alone; zero-sized surfaces are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f64 / height as f64;
        }
    }

    pub fn forward(&self) -> Vector3d {
        (self.target - self.position)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(|| -Vector3d::z())
    }

    /// Camera-space X axis in world coordinates
    pub fn right(&self) -> Vector3d {
        self.forward()
            .cross(&self.up)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3d::x)
    }

    /// Camera-space Y axis in world coordinates
    pub fn camera_up(&self) -> Vector3d {
        self.right().cross(&self.forward())
    }

    /// Distance from the camera to the world origin
    pub fn distance_to_origin(&self) -> f64 {
        self.position.coords.norm()
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix, already remapped to wgpu clip depth
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        let perspective = Perspective3::new(self.aspect, self.fov_radians(), self.near, self.far);
        opengl_to_wgpu_matrix() * perspective.into_inner()
    }

    pub fn view_projection(&self) -> Matrix4<f64> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3d::new(0.0, 0.0, 5.0), 75.0, 1.0, 0.1, 1000.0)
    }
}
