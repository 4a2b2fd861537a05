//! Error types for core domain operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building domain values
#[derive(Debug, Error)]
pub enum CoreError {
    /// Path has no usable UTF-8 file name
    #[error("Path has no usable file name: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Path does not refer to a regular file
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Failed to stat the file
    #[error("Failed to read file information for {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
