//! Error types for the capability module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from locating, probing or installing the transcoder.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// No transcoder binary at any searched location.
    #[error("FFmpeg not found (searched {} locations)", .searched.len())]
    NotFound { searched: Vec<PathBuf> },

    /// Binaries were found but none answered a version query.
    #[error("FFmpeg found but not working: {}", format_paths(.candidates))]
    Unresponsive { candidates: Vec<PathBuf> },

    /// The encoder listing could not be obtained.
    #[error("Failed to list encoders of {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },

    /// No install command is configured for this platform.
    #[error("No install command configured")]
    InstallUnavailable,

    /// The install command ran and failed.
    #[error("FFmpeg install failed: {reason}")]
    InstallFailed { reason: String },

    /// A query or install exceeded its time limit.
    #[error("{what} timed out after {timeout_secs} seconds")]
    Timeout { what: String, timeout_secs: u64 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl CapabilityError {
    pub fn probe_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn install_failed(reason: impl Into<String>) -> Self {
        Self::InstallFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CapabilityError::NotFound {
            searched: vec![PathBuf::from("/a/ffmpeg"), PathBuf::from("/b/ffmpeg")],
        };
        assert_eq!(err.to_string(), "FFmpeg not found (searched 2 locations)");

        let err = CapabilityError::Unresponsive {
            candidates: vec![PathBuf::from("/a/ffmpeg")],
        };
        assert_eq!(err.to_string(), "FFmpeg found but not working: /a/ffmpeg");

        let err = CapabilityError::Timeout {
            what: "ffmpeg -version".to_string(),
            timeout_secs: 10,
        };
        assert_eq!(err.to_string(), "ffmpeg -version timed out after 10 seconds");
    }
}
