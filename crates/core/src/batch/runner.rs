//! Batch orchestrator implementation.
//!
//! One spawned task runs the whole batch:
//! - Pre-flight: probe sources, check the codec, check the output directory
//! - Jobs: strictly sequential, in input order, each down the fallback chain
//!
//! The caller only sees ordered `BatchEvent`s on an unbounded channel.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use crate::capability::{CapabilityGate, Readiness};
use crate::chain::{ChainProgress, JobOutcome, TranscodeFallbackChain, TranscodeJob};
use crate::loop_filter::LoopParameters;
use crate::media::{MediaProber, ProbeError, VideoDescriptor};
use crate::transcoder::Transcoder;

use super::config::BatchConfig;
use super::error::{BatchAbort, BatchError};
use super::sources::{expand_sources, plan_output_path};
use super::types::{BatchEvent, BatchProgress, BatchReport, ReportEntry};

/// Accepts batches and runs them one at a time.
pub struct BatchOrchestrator {
    config: BatchConfig,
    prober: Arc<dyn MediaProber>,
    transcoder: Arc<dyn Transcoder>,
    gate: Arc<CapabilityGate>,
    running: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    pub fn new(
        config: BatchConfig,
        prober: Arc<dyn MediaProber>,
        transcoder: Arc<dyn Transcoder>,
        gate: Arc<CapabilityGate>,
    ) -> Self {
        Self {
            config,
            prober,
            transcoder,
            gate,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a batch is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts a batch in the background.
    ///
    /// Rejected while another batch is running. Must be called from within
    /// a tokio runtime.
    pub fn submit_batch(
        &self,
        sources: Vec<PathBuf>,
        params: LoopParameters,
        output_dir: impl Into<PathBuf>,
    ) -> Result<BatchHandle, BatchError> {
        params.validate()?;
        if sources.is_empty() {
            return Err(BatchError::NoSources);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Batch rejected: another batch is running");
            return Err(BatchError::AlreadyRunning);
        }
        let guard = RunningGuard(self.running.clone());

        let batch_id = uuid::Uuid::new_v4().to_string();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = BatchWorker {
            batch_id: batch_id.clone(),
            config: self.config.clone(),
            prober: self.prober.clone(),
            transcoder: self.transcoder.clone(),
            gate: self.gate.clone(),
            events: events_tx,
            cancel: cancel.clone(),
            running: guard,
        };
        let output_dir = output_dir.into();

        info!(
            "Submitting batch {} ({} sources, {} overlap, {})",
            batch_id,
            sources.len(),
            params.overlap,
            params.codec
        );
        let task = tokio::spawn(worker.run(sources, params, output_dir));

        Ok(BatchHandle {
            batch_id,
            events: events_rx,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            task,
        })
    }
}

/// Clears the running flag when dropped, so a panicking batch task
/// does not leave the orchestrator locked.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The caller's side of a running batch.
///
/// Dropping the handle cancels the batch.
pub struct BatchHandle {
    batch_id: String,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancellationToken,
    _cancel_on_drop: DropGuard,
    task: JoinHandle<()>,
}

impl BatchHandle {
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// Next event, or `None` once the worker is gone.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Requests cancellation. The running transcoder is killed and no
    /// further jobs start; a `Completed` report still follows.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this batch when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drains the remaining events and returns the terminal one.
    pub async fn wait(mut self) -> Option<BatchEvent> {
        let mut terminal = None;
        while let Some(event) = self.events.recv().await {
            if event.is_terminal() {
                terminal = Some(event);
            }
        }
        if let Err(e) = self.task.await {
            error!("Batch {} task failed: {}", self.batch_id, e);
        }
        terminal
    }
}

struct BatchWorker {
    batch_id: String,
    config: BatchConfig,
    prober: Arc<dyn MediaProber>,
    transcoder: Arc<dyn Transcoder>,
    gate: Arc<CapabilityGate>,
    events: mpsc::UnboundedSender<BatchEvent>,
    cancel: CancellationToken,
    running: RunningGuard,
}

impl BatchWorker {
    fn emit(&self, event: BatchEvent) {
        if self.events.send(event).is_err() {
            debug!("Batch {} event receiver dropped", self.batch_id);
        }
    }

    /// Leaves the running state, then delivers the terminal event.
    fn finish(self, event: BatchEvent) {
        let Self {
            batch_id,
            events,
            running,
            ..
        } = self;
        drop(running);
        if events.send(event).is_err() {
            debug!("Batch {} event receiver dropped", batch_id);
        }
    }

    async fn run(self, sources: Vec<PathBuf>, params: LoopParameters, output_dir: PathBuf) {
        let started_at = Utc::now();
        let mut report = BatchReport::new(self.batch_id.clone(), started_at);

        let sources = expand_sources(&sources, &self.config.video_extensions).await;
        let (videos, skipped) = match self.probe_all(&sources).await {
            Ok(probed) => probed,
            Err(abort) => {
                error!("Batch {} aborted: {}", self.batch_id, abort);
                self.finish(BatchEvent::Aborted(abort));
                return;
            }
        };
        report.skipped = skipped;

        let readiness = self.gate.ensure_ready(params.codec).await;
        let program = match readiness {
            Readiness::Ready { path } => path,
            readiness => {
                error!("Batch {} aborted: {}", self.batch_id, readiness);
                self.finish(BatchEvent::Aborted(BatchAbort::CapabilityUnready(readiness)));
                return;
            }
        };

        if let Err(abort) = ensure_writable(&output_dir).await {
            error!("Batch {} aborted: {}", self.batch_id, abort);
            self.finish(BatchEvent::Aborted(abort));
            return;
        }

        let total = videos.len();
        info!("Batch {} started: {} jobs", self.batch_id, total);
        self.emit(BatchEvent::Started {
            batch_id: self.batch_id.clone(),
            total,
        });

        let chain = TranscodeFallbackChain::new(self.transcoder.clone(), program);
        let mut taken = HashSet::new();

        for (index, video) in videos.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let output_path = plan_output_path(
                &output_dir,
                &video.path,
                &self.config.output_suffix,
                params.codec.profile().container,
                self.config.overwrite,
                &taken,
            );
            taken.insert(output_path.clone());

            let job = TranscodeJob::new(video, output_path, params);
            let filename = job.filename();
            info!("Processing {}/{}: {}", index + 1, total, filename);

            let on_progress = |progress: ChainProgress| {
                self.emit(BatchEvent::Progress(BatchProgress {
                    index,
                    total,
                    filename: filename.clone(),
                    strategy: progress.strategy,
                    percent: progress.percent,
                }));
            };
            let outcome = chain.run(&job, &self.cancel, &on_progress).await;

            if outcome == JobOutcome::Cancelled {
                report.cancelled = true;
            }
            self.emit(BatchEvent::JobFinished {
                index,
                total,
                filename: filename.clone(),
                outcome: outcome.clone(),
            });
            report.entries.push(ReportEntry {
                filename,
                output_path: job.output_path,
                outcome,
            });

            if report.cancelled {
                break;
            }
        }

        if self.cancel.is_cancelled() {
            report.cancelled = true;
        }
        report.finished_at = Utc::now();
        info!(
            "Batch {} {}: {} succeeded, {} failed",
            self.batch_id,
            if report.cancelled { "cancelled" } else { "completed" },
            report.succeeded().len(),
            report.failed().len()
        );
        self.finish(BatchEvent::Completed(report));
    }

    /// Probes every source, dropping the unreadable ones.
    ///
    /// A missing prober binary aborts instead, since no source could be read.
    async fn probe_all(
        &self,
        sources: &[PathBuf],
    ) -> Result<(Vec<VideoDescriptor>, usize), BatchAbort> {
        let mut videos = Vec::with_capacity(sources.len());
        let mut skipped = 0;
        for path in sources {
            match self.prober.probe(path).await {
                Ok(video) => {
                    debug!(
                        "Probed {}: {:.2}s at {} fps, {}x{}",
                        video.filename(),
                        video.duration_secs(),
                        video.frame_rate,
                        video.width,
                        video.height
                    );
                    videos.push(video);
                }
                Err(ProbeError::FfprobeNotFound { path: ffprobe }) => {
                    return Err(BatchAbort::ProberMissing { path: ffprobe });
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    skipped += 1;
                }
            }
        }
        Ok((videos, skipped))
    }
}

/// Creates the output directory if needed and checks a file can be written.
async fn ensure_writable(dir: &Path) -> Result<(), BatchAbort> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| BatchAbort::output_dir_unwritable(dir, e.to_string()))?;

    let probe = dir.join(format!(".looper-write-test-{}", uuid::Uuid::new_v4()));
    tokio::fs::write(&probe, b"")
        .await
        .map_err(|e| BatchAbort::output_dir_unwritable(dir, e.to_string()))?;
    if let Err(e) = tokio::fs::remove_file(&probe).await {
        warn!("Failed to remove write test file {}: {}", probe.display(), e);
    }
    Ok(())
}
