//! Point cloud codecs
//!
//! Two formats are supported: a plain coordinate list (`x y z [r g b]` per
//! line) and the ASCII subset of PLY with float positions and byte colours.
//! Format selection is by resource-name suffix: `.ply` is PLY, everything
//! else is read as a coordinate list.

pub mod error;
pub mod list;
pub mod ply;

pub use error::*;
pub use list::{parse_list, serialize_list};
pub use ply::{parse_mesh, serialize_mesh};

use eagleeye_core::{PointSet, Result};
use std::path::Path;

/// On-disk point cloud formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Whitespace-separated coordinate list
    List,
    /// ASCII PLY
    Mesh,
}

impl Format {
    /// Choose a format from a file name, path or URL.
    ///
    /// Query strings and fragments are ignored and the comparison is
    /// case-insensitive.
    pub fn from_name(name: &str) -> Self {
        let name = name.split(['?', '#']).next().unwrap_or(name);
        if name.to_ascii_lowercase().ends_with(".ply") {
            Format::Mesh
        } else {
            Format::List
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::from_name(&path.as_ref().to_string_lossy())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::List => "txt",
            Format::Mesh => "ply",
        }
    }

    /// Decode raw bytes. Coordinate lists are decoded leniently as UTF-8.
    pub fn parse(&self, bytes: &[u8]) -> Result<PointSet> {
        match self {
            Format::List => Ok(parse_list(&String::from_utf8_lossy(bytes))),
            Format::Mesh => Ok(parse_mesh(bytes)?),
        }
    }

    pub fn serialize(&self, points: &PointSet) -> Vec<u8> {
        match self {
            Format::List => serialize_list(points).into_bytes(),
            Format::Mesh => serialize_mesh(points),
        }
    }
}

/// Parse bytes whose format is implied by `name`.
pub fn parse_named(name: &str, bytes: &[u8]) -> Result<PointSet> {
    Format::from_name(name).parse(bytes)
}

/// Read a point cloud file, choosing the codec by suffix.
pub fn read_point_set<P: AsRef<Path>>(path: P) -> Result<PointSet> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let set = Format::from_path(path).parse(&bytes)?;
    log::info!("Read {} points from {}", set.len(), path.display());
    Ok(set)
}

/// Write a point cloud file, choosing the codec by suffix.
pub fn write_point_set<P: AsRef<Path>>(points: &PointSet, path: P) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, Format::from_path(path).serialize(points))?;
    log::info!("Wrote {} points to {}", points.len(), path.display());
    Ok(())
}
