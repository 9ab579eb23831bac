//! Error types for resource loading.

use std::path::PathBuf;
use thiserror::Error;

use glimmer_rhi::RhiError;

/// Error type for resource loading operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// GPU resource creation error.
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Model data that cannot be uploaded.
    #[error("Invalid model data: {0}")]
    InvalidModel(String),
}

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
