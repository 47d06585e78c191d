//! Types for the fallback chain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::loop_filter::LoopParameters;
use crate::media::VideoDescriptor;

use super::strategy::Strategy;

/// One source, one output, one set of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeJob {
    pub video: VideoDescriptor,
    pub output_path: PathBuf,
    pub params: LoopParameters,
}

impl TranscodeJob {
    pub fn new(video: VideoDescriptor, output_path: impl Into<PathBuf>, params: LoopParameters) -> Self {
        Self {
            video,
            output_path: output_path.into(),
            params,
        }
    }

    /// Source file name, as reported to the caller.
    pub fn filename(&self) -> String {
        self.video.filename()
    }
}

/// Progress of the rung currently running.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainProgress {
    pub strategy: Strategy,
    pub percent: f32,
}

/// One failed rung, kept for logs and postmortems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: Strategy,
    pub reason: String,
    /// Tail of the transcoder's stderr. Never shown to end users.
    #[serde(default, skip_serializing)]
    pub diagnostics: Vec<String>,
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// A rung produced the output file.
    Succeeded { strategy: Strategy },
    /// Every rung failed.
    Failed { attempts: Vec<StrategyFailure> },
    /// The batch was cancelled while this job ran.
    Cancelled,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { strategy } => write!(f, "succeeded ({})", strategy),
            Self::Failed { .. } => f.write_str("failed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}
