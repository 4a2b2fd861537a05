//! Error types for the ingestion engine
//!
//! Filename mismatches and unstable files are not errors; the pipeline
//! reports them as skips. Everything here is a per-file failure that leaves
//! the file where it was, except [`LibraryError::Watcher`] which concerns
//! discovery itself.

use shelfwatch_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid file: {0}")]
    InvalidFile(#[from] CoreError),

    #[error("Metadata error for {}: {reason}", .path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("Conversion failed for {}: {reason}", .path.display())]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Filesystem error on {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Watcher error: {0}")]
    Watcher(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl LibraryError {
    pub(crate) fn metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conversion(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
