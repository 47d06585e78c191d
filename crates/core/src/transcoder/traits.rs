//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::TranscodeError;
use super::types::{TranscodeExit, TranscodeInvocation};

/// Runs an external transcoder process.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Runs the invocation to completion.
    ///
    /// Every line of diagnostic output is passed to `on_line` as it
    /// arrives. A non-zero exit is reported in the returned `TranscodeExit`,
    /// not as an error. When `cancel` fires the process is killed and
    /// `TranscodeError::Cancelled` is returned.
    async fn run(
        &self,
        invocation: &TranscodeInvocation,
        cancel: &CancellationToken,
        on_line: &(dyn for<'l> Fn(&'l str) + Send + Sync),
    ) -> Result<TranscodeExit, TranscodeError>;
}
