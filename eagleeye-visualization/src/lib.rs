//! Interactive viewing for eagleeye point clouds
//!
//! This crate ties the codecs and the renderer into a viewer:
//! - Perspective camera and damped orbit controls
//! - Scene manager that rebuilds the renderable cloud when data or appearance change
//! - Input handling, including middle-drag object panning
//! - Background loading from files, URLs and memory, plus export
//! - The winit event loop that drives it all
//!
//! Everything except [`viewer`] runs without a window or GPU.
//!
//! ```no_run
//! use eagleeye_core::{ViewerConfig, ViewerParameters};
//! use eagleeye_visualization::{run_viewer, LoadSource};
//!
//! run_viewer(
//!     ViewerConfig::default(),
//!     ViewerParameters::default(),
//!     Some(LoadSource::from_location("scan.ply")),
//! )?;
//! # Ok::<(), eagleeye_core::Error>(())
//! ```

pub mod camera;
pub mod controls;
pub mod scene;
pub mod interaction;
pub mod loader;
pub mod viewer;

pub use camera::*;
pub use controls::*;
pub use scene::*;
pub use interaction::*;
pub use loader::*;
pub use viewer::*;
