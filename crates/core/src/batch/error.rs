//! Error types for the batch module.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::capability::Readiness;
use crate::loop_filter::ParameterError;

/// Reasons `submit_batch` refuses a request outright.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Another batch has not finished yet.
    #[error("A batch is already running")]
    AlreadyRunning,

    /// The request named no sources.
    #[error("No source files given")]
    NoSources,

    /// The loop parameters are invalid.
    #[error("Invalid loop parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
}

/// Pre-flight failures that stop a batch before any job starts.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchAbort {
    /// The output directory cannot be created or written to.
    #[error("Output directory {path} is not writable: {reason}")]
    OutputDirUnwritable { path: PathBuf, reason: String },

    /// The media prober binary is missing, so no source can be read.
    #[error("FFprobe not found at {path}; install FFmpeg to continue")]
    ProberMissing { path: PathBuf },

    /// The transcoder cannot encode the requested codec.
    #[error("{0}")]
    CapabilityUnready(Readiness),
}

impl BatchAbort {
    pub fn output_dir_unwritable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OutputDirUnwritable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether installing or upgrading the transcoder could fix this.
    pub fn offers_install(&self) -> bool {
        matches!(
            self,
            Self::ProberMissing { .. } | Self::CapabilityUnready(Readiness::NeedsInstall { .. })
        )
    }
}
