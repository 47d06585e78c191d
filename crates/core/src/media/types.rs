//! Types for the media module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Immutable snapshot of a source video, taken once at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    /// Source file path.
    pub path: PathBuf,
    /// Frames per second (expected > 0).
    pub frame_rate: f64,
    /// Total number of frames.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl VideoDescriptor {
    /// Creates a descriptor from raw probe values.
    pub fn new(
        path: impl Into<PathBuf>,
        frame_rate: f64,
        frame_count: u64,
        width: u32,
        height: u32,
        size_bytes: u64,
    ) -> Self {
        Self {
            path: path.into(),
            frame_rate,
            frame_count,
            width,
            height,
            size_bytes,
        }
    }

    /// Duration in seconds, derived from frame count and rate.
    ///
    /// Zero when the frame rate is unknown.
    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate > 0.0 {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }

    /// File name component of the source path, for reporting.
    pub fn filename(&self) -> String {
        file_name_of(&self.path)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
