//! Scene state: camera, orbit controls, the point object and the axes marker
//!
//! Everything here is CPU-side. The renderer pulls vertex data whenever
//! [`SceneManager::revision`] moves and draws with [`SceneManager::frame_uniforms`].

use crate::camera::Camera;
use crate::controls::OrbitControls;
use eagleeye_core::{
    color_for, normalize, Appearance, BoundingBox, PointSet, Point3d, Vector3d, ViewerConfig,
    ViewerParameters,
};
use eagleeye_gpu::{FrameUniforms, PointVertex};
use nalgebra::{Matrix4, Rotation3, Translation3};

/// The renderable built from one point set under one appearance.
///
/// Never modified after construction except for its transform; any change to
/// the data or appearance builds a new object.
#[derive(Debug, Clone)]
pub struct PointCloudObject {
    vertices: Vec<PointVertex>,
    local_bounds: BoundingBox,
    point_size: f32,
    /// Translation applied by object panning
    pub position: Vector3d,
    /// Rotation about the vertical axis, advanced while animating
    pub rotation_y: f64,
}

impl PointCloudObject {
    /// Centre and scale `points` to `target_radius` and colour them.
    pub fn build(points: &PointSet, appearance: &Appearance, target_radius: f64) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let bbox = points.bounding_box();
        let normalized = normalize(points.as_slice(), &bbox, target_radius);
        let vertices: Vec<PointVertex> = points
            .iter()
            .zip(&normalized.points)
            .map(|(p, n)| {
                let color = color_for(p, &bbox, appearance.color_mode, appearance.uniform_color);
                PointVertex::new([n.x as f32, n.y as f32, n.z as f32], color)
            })
            .collect();

        Some(Self {
            vertices,
            local_bounds: BoundingBox::from_positions(normalized.points.iter().copied()),
            point_size: appearance.point_size,
            position: Vector3d::zeros(),
            rotation_y: 0.0,
        })
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn local_bounds(&self) -> &BoundingBox {
        &self.local_bounds
    }

    /// Object-to-world transform: rotate about Y, then translate.
    pub fn model_matrix(&self) -> Matrix4<f64> {
        Translation3::from(self.position).to_homogeneous()
            * Rotation3::from_axis_angle(&Vector3d::y_axis(), self.rotation_y).to_homogeneous()
    }

    /// World-space box around the transformed local box.
    pub fn world_bounds(&self) -> BoundingBox {
        let model = self.model_matrix();
        BoundingBox::from_positions(
            self.local_bounds
                .corners()
                .iter()
                .map(|c| model.transform_point(c)),
        )
    }
}

/// Three coloured lines from the origin along +X, +Y and +Z.
#[derive(Debug, Clone)]
pub struct AxesMarker {
    vertices: Vec<PointVertex>,
}

impl AxesMarker {
    pub fn new(length: f64) -> Self {
        let l = length as f32;
        let vertices = vec![
            PointVertex::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            PointVertex::new([l, 0.0, 0.0], [1.0, 0.6, 0.0]),
            PointVertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            PointVertex::new([0.0, l, 0.0], [0.6, 1.0, 0.0]),
            PointVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            PointVertex::new([0.0, 0.0, l], [0.0, 0.6, 1.0]),
        ];
        Self { vertices }
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }
}

/// Snapshot of the camera and orbit settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point3d,
    pub target: Point3d,
    pub fov_deg: f64,
    pub damping: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

/// Owns the camera, orbit controls and the single active point object.
pub struct SceneManager {
    config: ViewerConfig,
    camera: Camera,
    controls: OrbitControls,
    object: Option<PointCloudObject>,
    axes: Option<AxesMarker>,
    source: PointSet,
    appearance: Option<Appearance>,
    revision: u64,
    width: u32,
    height: u32,
    running: bool,
}

impl SceneManager {
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let [x, y, z] = config.initial_camera_position;
        let aspect = width.max(1) as f64 / height.max(1) as f64;
        let mut camera = Camera::new(
            Point3d::new(x, y, z),
            config.fov_deg,
            aspect,
            config.near,
            config.far,
        );
        camera.look_at(Point3d::origin());
        let controls = OrbitControls::new(&config);

        Self {
            config,
            camera,
            controls,
            object: None,
            axes: None,
            source: PointSet::new(),
            appearance: None,
            revision: 0,
            width: width.max(1),
            height: height.max(1),
            running: true,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// Camera and controls together, for input that needs to read one while
    /// writing the other.
    pub fn camera_and_controls(&mut self) -> (&Camera, &mut OrbitControls) {
        (&self.camera, &mut self.controls)
    }

    pub fn object(&self) -> Option<&PointCloudObject> {
        self.object.as_ref()
    }

    pub fn object_mut(&mut self) -> Option<&mut PointCloudObject> {
        self.object.as_mut()
    }

    pub fn axes(&self) -> Option<&AxesMarker> {
        self.axes.as_ref()
    }

    /// Bumped on every rebuild; the renderer re-uploads when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Rebuild if the point set or any appearance parameter differs from
    /// what the current object was built from. Returns whether it rebuilt.
    pub fn sync(&mut self, points: &PointSet, params: &ViewerParameters) -> bool {
        let appearance = params.appearance();
        let unchanged = self.source.ptr_eq(points) && self.appearance == Some(appearance);
        if unchanged || !self.running {
            return false;
        }
        self.rebuild(points, params);
        true
    }

    /// Dispose the current object and axes, then build replacements from
    /// `points`. An empty point set leaves the scene bare.
    pub fn rebuild(&mut self, points: &PointSet, params: &ViewerParameters) {
        self.object = None;
        self.axes = None;

        let appearance = params.appearance();
        self.source = points.clone();
        self.appearance = Some(appearance);
        self.revision += 1;

        let Some(object) = PointCloudObject::build(points, &appearance, self.config.target_radius)
        else {
            log::debug!("Scene cleared (revision {})", self.revision);
            return;
        };

        if self.config.axis_length > 0.0 {
            self.axes = Some(AxesMarker::new(self.config.axis_length));
        }
        log::info!(
            "Built point object: {} points, mode {}, size {:.2} (revision {})",
            object.len(),
            appearance.color_mode,
            appearance.point_size,
            self.revision
        );
        self.object = Some(object);
    }

    /// Advance one frame of animation and camera damping.
    pub fn tick(&mut self, params: &ViewerParameters) {
        if !self.running {
            return;
        }
        if params.is_animating {
            if let Some(object) = self.object.as_mut() {
                object.rotation_y += self.config.rotation_step;
            }
        }
        self.controls.update(&mut self.camera);
    }

    /// Match the camera aspect and surface size to a resized container.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.camera.set_viewport(width, height);
    }

    /// Frame the current object: put the camera on +Z from the centre of its
    /// world-space box, `reset_distance_factor` times the largest extent
    /// away, and orbit around that centre. Returns `None` when nothing is
    /// rendered.
    pub fn reset_camera(&mut self) -> Option<CameraState> {
        let bounds = self.object.as_ref()?.world_bounds();
        let center = bounds.center();
        let distance = bounds.max_extent() * self.config.reset_distance_factor;

        self.camera.position = center + Vector3d::new(0.0, 0.0, distance);
        self.camera.look_at(center);
        self.controls.target = center;
        self.controls.update(&mut self.camera);

        log::debug!("Camera reset to {:?} looking at {:?}", self.camera.position, center);
        Some(self.camera_state())
    }

    pub fn camera_state(&self) -> CameraState {
        CameraState {
            position: self.camera.position,
            target: self.controls.target,
            fov_deg: self.camera.fov_deg,
            damping: self.controls.damping,
            min_distance: self.controls.min_distance,
            max_distance: self.controls.max_distance,
        }
    }

    pub fn frame_uniforms(&self) -> FrameUniforms {
        let (model, point_size) = match &self.object {
            Some(object) => (object.model_matrix(), object.point_size()),
            None => (Matrix4::identity(), 0.0),
        };
        FrameUniforms {
            view_proj: self.camera.view_projection().cast::<f32>(),
            model: model.cast::<f32>(),
            point_size,
        }
    }

    pub fn point_vertices(&self) -> &[PointVertex] {
        self.object.as_ref().map(|o| o.vertices()).unwrap_or(&[])
    }

    pub fn axis_vertices(&self) -> &[PointVertex] {
        self.axes.as_ref().map(|a| a.vertices()).unwrap_or(&[])
    }

    /// Release the object and axes and stop the loop. Later `sync` and
    /// `tick` calls do nothing.
    pub fn teardown(&mut self) {
        self.object = None;
        self.axes = None;
        self.source = PointSet::new();
        self.appearance = None;
        self.controls.stop();
        self.revision += 1;
        self.running = false;
        log::debug!("Scene torn down");
    }
}
