//! Error types for a single fallback rung.

use thiserror::Error;

use crate::transcoder::TranscodeError;

/// Why one rung of the ladder did not produce output.
#[derive(Debug, Error)]
pub enum RungError {
    /// The job's inputs cannot drive this strategy.
    #[error("Cannot build arguments: {0}")]
    Degenerate(String),

    /// The transcoder could not be run.
    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    /// The transcoder ran and exited unsuccessfully.
    #[error("Transcoder exited with code: {code:?}")]
    Exit {
        code: Option<i32>,
        diagnostics: Vec<String>,
    },
}

impl RungError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::Degenerate(reason.into())
    }

    /// Whether the rung stopped because the batch was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transcode(e) if e.is_cancelled())
    }

    /// Captured transcoder output, if the process got far enough to emit any.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::Exit { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}
