//! Error types for mesh and texture loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::gpu::TextureHandle;

/// Failure to turn an OBJ file into mesh data.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Failed to read OBJ file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("OBJ contained no shapes")]
    NoShapes,
}

impl MeshError {
    pub(crate) fn parse(line_no: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line: line_no + 1,
            message: message.into(),
        }
    }
}

/// Error type for graphics context operations.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("Unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    #[error("Pixel data size mismatch: {width}x{height} RGB8 needs {expected} bytes, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Failure to turn an image file into a populated texture.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Texture failed to load at path: {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture upload failed: {0}")]
    Gpu(#[from] GpuError),
}
