//! # eagleeye GPU
//!
//! wgpu plumbing for the eagleeye viewer: device and surface setup, the point
//! sprite and axis line pipelines, and vertex buffers that are destroyed as
//! soon as the scene replaces them.
//!
//! ```rust,no_run
//! use eagleeye_gpu::{FrameUniforms, PointCloudRenderer, PointVertex};
//! use nalgebra::Matrix4;
//! use std::sync::Arc;
//!
//! fn draw(window: Arc<winit::window::Window>) -> eagleeye_core::Result<()> {
//!     let mut renderer = pollster::block_on(PointCloudRenderer::new(window, [0.1, 0.1, 0.18]))?;
//!     renderer.upload(1, &[PointVertex::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])], &[]);
//!     renderer.render(&FrameUniforms {
//!         view_proj: Matrix4::identity(),
//!         model: Matrix4::identity(),
//!         point_size: 0.05,
//!     })
//! }
//! ```

pub mod device;
pub mod renderer;

pub use device::GpuContext;
pub use renderer::{FrameUniforms, GpuBuffer, PointCloudRenderer, PointVertex};
