//! Trait definitions for the media module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ProbeError;
use super::types::VideoDescriptor;

/// Reads the metadata of a source video.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Returns the name of this prober implementation.
    fn name(&self) -> &str;

    /// Probes a source file and snapshots its metadata.
    async fn probe(&self, path: &Path) -> Result<VideoDescriptor, ProbeError>;
}
