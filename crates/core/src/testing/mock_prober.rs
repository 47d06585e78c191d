//! Mock media prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::{MediaProber, ProbeError, VideoDescriptor};

/// Mock implementation of the MediaProber trait.
///
/// Paths with a configured descriptor probe successfully; every other path
/// is reported unreadable. Probed paths are recorded.
#[derive(Debug, Default)]
pub struct MockProber {
    /// Configured descriptors by path.
    descriptors: Arc<RwLock<HashMap<PathBuf, VideoDescriptor>>>,
    /// Paths probed so far, in call order.
    probed: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own path.
    pub async fn add_video(&self, video: VideoDescriptor) {
        self.descriptors
            .write()
            .await
            .insert(video.path.clone(), video);
    }

    /// Make a previously registered path unreadable.
    pub async fn remove_video(&self, path: impl AsRef<Path>) {
        self.descriptors.write().await.remove(path.as_ref());
    }

    /// Paths probed so far.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }
}

#[async_trait]
impl MediaProber for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<VideoDescriptor, ProbeError> {
        self.probed.write().await.push(path.to_path_buf());

        match self.descriptors.read().await.get(path) {
            Some(video) => Ok(video.clone()),
            None => Err(ProbeError::unreadable(path, "mock: no descriptor configured")),
        }
    }
}
