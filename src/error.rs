use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by scene management and frame capture.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("scene already holds {capacity} lights")]
    LightCapacity { capacity: usize },
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(u32),
    #[error("end time {end} ms precedes start time {start} ms")]
    InvalidTimeRange { start: u64, end: u64 },
    #[error("failed to write frame {path}")]
    Capture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to create output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while reading a particle system descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("failed to read descriptor {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected `key: value`")]
    Syntax { line: usize },
    #[error("line {line}: invalid number for `{key}`")]
    InvalidNumber { key: String, line: usize },
}

/// Failures while resolving a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("texture {0} not found")]
    NotFound(String),
    #[error("failed to decode texture {name}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}
