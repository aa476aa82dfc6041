//! Error types for eagleeye

use thiserror::Error;

/// Main error type for viewer operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unrecognised geometry data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The bytes for a cloud could not be obtained (network or file failure).
    #[error("Load error: {0}")]
    Load(String),

    /// Render surface or GPU resource creation failed; the viewer cannot continue.
    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Whether the viewer instance can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Resource(_))
    }
}

/// Result type alias for viewer operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidData(e.to_string())
    }
}

#[cfg(feature = "gpu")]
impl From<wgpu::SurfaceError> for Error {
    fn from(e: wgpu::SurfaceError) -> Self {
        Error::Resource(e.to_string())
    }
}

#[cfg(feature = "gpu")]
impl From<wgpu::CreateSurfaceError> for Error {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        Error::Resource(format!("Failed to create surface: {}", e))
    }
}

#[cfg(feature = "gpu")]
impl From<wgpu::RequestDeviceError> for Error {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        Error::Resource(format!("Failed to create device: {}", e))
    }
}
