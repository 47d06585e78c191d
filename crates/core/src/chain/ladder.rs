//! Runs a job down the strategy ladder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::progress::{ProgressTracker, FINISHED_PERCENT};
use crate::transcoder::{TranscodeInvocation, Transcoder};

use super::error::RungError;
use super::strategy::Strategy;
use super::types::{ChainProgress, JobOutcome, StrategyFailure, TranscodeJob};

/// Produces one output file per job, trying each strategy in turn.
pub struct TranscodeFallbackChain {
    transcoder: Arc<dyn Transcoder>,
    program: PathBuf,
}

impl TranscodeFallbackChain {
    /// Creates a chain that runs `program` through `transcoder`.
    pub fn new(transcoder: Arc<dyn Transcoder>, program: impl Into<PathBuf>) -> Self {
        Self {
            transcoder,
            program: program.into(),
        }
    }

    /// Runs the ladder for one job.
    ///
    /// Never returns an error: each rung's failure is recorded and the next
    /// rung is tried. Partial output is removed after every failed rung.
    pub async fn run(
        &self,
        job: &TranscodeJob,
        cancel: &CancellationToken,
        on_progress: &(dyn Fn(ChainProgress) + Send + Sync),
    ) -> JobOutcome {
        let filename = job.filename();
        let mut attempts = Vec::new();

        for strategy in Strategy::LADDER {
            if cancel.is_cancelled() {
                return JobOutcome::Cancelled;
            }

            info!("[{}] Trying {}", filename, strategy);
            match self.attempt(strategy, job, cancel, on_progress).await {
                Ok(()) => {
                    on_progress(ChainProgress {
                        strategy,
                        percent: FINISHED_PERCENT,
                    });
                    info!("[{}] Finished with {}", filename, strategy);
                    return JobOutcome::Succeeded { strategy };
                }
                Err(e) if e.is_cancelled() => {
                    info!("[{}] Cancelled during {}", filename, strategy);
                    remove_partial_output(&job.output_path).await;
                    return JobOutcome::Cancelled;
                }
                Err(e) => {
                    warn!("[{}] {} failed: {}", filename, strategy, e);
                    let diagnostics = e.diagnostics().to_vec();
                    if !diagnostics.is_empty() {
                        warn!("[{}] transcoder output:\n{}", filename, diagnostics.join("\n"));
                    }
                    remove_partial_output(&job.output_path).await;
                    attempts.push(StrategyFailure {
                        strategy,
                        reason: e.to_string(),
                        diagnostics,
                    });
                }
            }
        }

        warn!("[{}] All {} strategies failed", filename, attempts.len());
        JobOutcome::Failed { attempts }
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        job: &TranscodeJob,
        cancel: &CancellationToken,
        on_progress: &(dyn Fn(ChainProgress) + Send + Sync),
    ) -> Result<(), RungError> {
        let args = strategy.build_args(job)?;
        let invocation = TranscodeInvocation::new(strategy.label(), &self.program, args);

        // A fresh tracker per rung: each rung has its own output length and
        // may settle on a different marker.
        let tracker = Mutex::new(ProgressTracker::new(strategy.progress_target(job)));
        let on_line = |line: &str| {
            let percent = match tracker.lock() {
                Ok(mut tracker) => tracker.observe(line),
                Err(_) => None,
            };
            if let Some(percent) = percent {
                on_progress(ChainProgress { strategy, percent });
            }
        };

        let exit = self.transcoder.run(&invocation, cancel, &on_line).await?;
        if exit.success() {
            Ok(())
        } else {
            Err(RungError::Exit {
                code: exit.code,
                diagnostics: exit.diagnostics,
            })
        }
    }
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockTranscoder, ScriptedRun};
    use crate::transcoder::TranscodeError;
    use tempfile::TempDir;

    fn job_in(dir: &TempDir) -> TranscodeJob {
        TranscodeJob::new(
            fixtures::clip("/clips/wave.mp4", 20.0, 30.0),
            dir.path().join("wave_LOOPER.mov"),
            fixtures::hap_params(),
        )
    }

    #[tokio::test]
    async fn test_failed_rungs_leave_no_partial_output() {
        let dir = TempDir::new().unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.set_default_run(ScriptedRun::fail(1)).await;
        let chain = TranscodeFallbackChain::new(transcoder.clone(), "/usr/bin/ffmpeg");

        let job = job_in(&dir);
        let outcome = chain.run(&job, &CancellationToken::new(), &|_: ChainProgress| {}).await;

        match outcome {
            JobOutcome::Failed { attempts } => {
                let strategies: Vec<_> = attempts.iter().map(|a| a.strategy).collect();
                assert_eq!(strategies, Strategy::LADDER.to_vec());
                assert!(attempts.iter().all(|a| !a.diagnostics.is_empty()));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!job.output_path.exists());
    }

    #[tokio::test]
    async fn test_spawn_errors_advance_the_ladder() {
        let dir = TempDir::new().unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.script("composite_loop", ScriptedRun::NotFound).await;
        let chain = TranscodeFallbackChain::new(transcoder.clone(), "/usr/bin/ffmpeg");

        let job = job_in(&dir);
        let outcome = chain.run(&job, &CancellationToken::new(), &|_: ChainProgress| {}).await;

        assert_eq!(
            outcome,
            JobOutcome::Succeeded {
                strategy: Strategy::SimpleRepeat
            }
        );
        assert!(job.output_path.exists());
    }

    #[tokio::test]
    async fn test_progress_ends_at_hundred() {
        let dir = TempDir::new().unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        transcoder
            .script(
                "composite_loop",
                ScriptedRun::with_lines(
                    0,
                    [
                        "frame=  285 fps=60 q=-0.0 size=  1024kB time=00:00:09.50 bitrate=N/A",
                        "frame=  570 fps=60 q=-0.0 size=  2048kB time=00:00:19.00 bitrate=N/A",
                    ],
                ),
            )
            .await;
        let chain = TranscodeFallbackChain::new(transcoder, "/usr/bin/ffmpeg");

        let seen = Mutex::new(Vec::new());
        let job = job_in(&dir);
        chain
            .run(&job, &CancellationToken::new(), &|p: ChainProgress| {
                seen.lock().unwrap().push(p.percent)
            })
            .await;

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert!((seen[0] - 50.0).abs() < 0.01);
        assert_eq!(seen[1], 95.0);
        assert_eq!(seen[2], 100.0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_ladder() {
        let dir = TempDir::new().unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        transcoder
            .script("composite_loop", ScriptedRun::until_cancelled())
            .await;
        let chain = TranscodeFallbackChain::new(transcoder.clone(), "/usr/bin/ffmpeg");

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let job = job_in(&dir);
        let outcome = chain.run(&job, &cancel, &|_: ChainProgress| {}).await;

        assert_eq!(outcome, JobOutcome::Cancelled);
        assert_eq!(transcoder.labels().await, vec!["composite_loop"]);
        assert!(!job.output_path.exists());
        assert!(RungError::from(TranscodeError::Cancelled).is_cancelled());
    }
}
