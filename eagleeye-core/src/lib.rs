//! Core data structures for the eagleeye point cloud viewer
//!
//! This crate holds everything the viewer needs that does not touch a file,
//! a window or a GPU: colored points, the immutable point set, bounding boxes
//! and normalisation, per-point colour mapping, and the viewer parameter and
//! configuration records shared by the other crates.

pub mod point;
pub mod point_set;
pub mod geometry;
pub mod color;
pub mod params;
pub mod config;
pub mod error;

pub use point::*;
pub use point_set::*;
pub use geometry::*;
pub use color::*;
pub use params::*;
pub use config::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
