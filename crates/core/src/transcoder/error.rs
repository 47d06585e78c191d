//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a transcoder run from producing an exit status.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Transcoder binary not found.
    #[error("Transcoder not found at path: {path}")]
    NotFound { path: PathBuf },

    /// The process could not be started.
    #[error("Failed to spawn transcoder: {0}")]
    Spawn(std::io::Error),

    /// I/O error while reading output or waiting for exit.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled and the process killed.
    #[error("Transcode cancelled")]
    Cancelled,
}

impl TranscodeError {
    /// Whether this error came from cancellation rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
