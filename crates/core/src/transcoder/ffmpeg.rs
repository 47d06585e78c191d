//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::lines::LineSplitter;
use super::traits::Transcoder;
use super::types::{TranscodeExit, TranscodeInvocation, DIAGNOSTIC_TAIL_LINES};

/// Runs ffmpeg as a child process.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Global arguments placed before the invocation's own.
    fn global_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-stats".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn run(
        &self,
        invocation: &TranscodeInvocation,
        cancel: &CancellationToken,
        on_line: &(dyn for<'l> Fn(&'l str) + Send + Sync),
    ) -> Result<TranscodeExit, TranscodeError> {
        if cancel.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }

        debug!("[{}] {}", invocation.label, invocation.command_line());

        let mut child = Command::new(&invocation.program)
            .args(self.global_args())
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::NotFound {
                        path: invocation.program.clone(),
                    }
                } else {
                    TranscodeError::Spawn(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("transcoder stderr was not captured"))?;
        let mut lines = LineSplitter::new(stderr);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);

        let finished = async {
            while let Some(line) = lines.next_line().await? {
                on_line(&line);
                if tail.len() == DIAGNOSTIC_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            child.wait().await
        };

        let status = tokio::select! {
            status = finished => status?,
            _ = cancel.cancelled() => {
                // `finished` is dropped here, releasing its borrow of `child`.
                let _ = child.kill().await;
                return Err(TranscodeError::Cancelled);
            }
        };

        Ok(TranscodeExit::new(status.code(), tail.into_iter().collect()))
    }
}
