//! Error types for the media module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing a source file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Source file does not exist.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// The prober ran but rejected the file.
    #[error("Failed to probe {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// The file has no video stream.
    #[error("No video stream in {path}")]
    NoVideoStream { path: PathBuf },

    /// Failed to parse prober output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error while probing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Creates a new unreadable-source error.
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
