//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::transcoder::{TranscodeError, TranscodeExit, TranscodeInvocation, Transcoder};

/// What a scripted run does when invoked.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedRun {
    /// Emit `lines` on the diagnostic stream, then exit with `code`.
    Exit { code: i32, lines: Vec<String> },
    /// Fail as if the binary were missing.
    NotFound,
    /// Emit `lines`, then block until cancelled.
    UntilCancelled { lines: Vec<String> },
}

impl ScriptedRun {
    /// Exit code 0 with a short stats line.
    pub fn succeed() -> Self {
        Self::Exit {
            code: 0,
            lines: vec!["frame=   10 fps=0.0 q=-0.0 size=       0kB time=00:00:00.33".to_string()],
        }
    }

    /// Non-zero exit with an error line.
    pub fn fail(code: i32) -> Self {
        Self::Exit {
            code,
            lines: vec!["Error while filtering: Invalid argument".to_string()],
        }
    }

    /// Exit with `code` after emitting the given lines.
    pub fn with_lines<I, S>(code: i32, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exit {
            code,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn until_cancelled() -> Self {
        Self::UntilCancelled { lines: Vec::new() }
    }
}

/// Mock implementation of the Transcoder trait.
///
/// Runs are scripted per invocation label (the strategy label for runs
/// coming from the fallback chain). Unscripted labels use the default run,
/// which succeeds. Every invocation is recorded.
///
/// # Example
///
/// ```rust,ignore
/// use looper_core::testing::{MockTranscoder, ScriptedRun};
///
/// let transcoder = MockTranscoder::new();
/// transcoder.script("composite_loop", ScriptedRun::fail(1)).await;
///
/// // ... run a chain ...
///
/// assert_eq!(transcoder.labels().await, vec!["composite_loop", "simple_repeat"]);
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    /// Recorded invocations, in call order.
    invocations: Arc<RwLock<Vec<TranscodeInvocation>>>,
    /// Scripted runs by invocation label.
    scripts: Arc<RwLock<HashMap<String, ScriptedRun>>>,
    /// Run used for labels without a script.
    default_run: Arc<RwLock<ScriptedRun>>,
    /// Whether a run writes its output file (the last argument).
    write_output: Arc<RwLock<bool>>,
    /// Simulated run time before exiting.
    run_duration_ms: Arc<RwLock<u64>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder whose runs all succeed.
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(RwLock::new(Vec::new())),
            scripts: Arc::new(RwLock::new(HashMap::new())),
            default_run: Arc::new(RwLock::new(ScriptedRun::succeed())),
            write_output: Arc::new(RwLock::new(true)),
            run_duration_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Script the run for one invocation label.
    pub async fn script(&self, label: &str, run: ScriptedRun) {
        self.scripts.write().await.insert(label.to_string(), run);
    }

    /// Set the run used for unscripted labels.
    pub async fn set_default_run(&self, run: ScriptedRun) {
        *self.default_run.write().await = run;
    }

    /// Enable or disable writing the output file.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    /// Set the simulated run time.
    pub async fn set_run_duration(&self, duration: Duration) {
        *self.run_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Get all recorded invocations.
    pub async fn recorded_invocations(&self) -> Vec<TranscodeInvocation> {
        self.invocations.read().await.clone()
    }

    /// Labels of recorded invocations, in call order.
    pub async fn labels(&self) -> Vec<String> {
        self.invocations
            .read()
            .await
            .iter()
            .map(|i| i.label.clone())
            .collect()
    }

    /// Get the number of invocations.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    async fn touch_output(&self, invocation: &TranscodeInvocation) {
        if !*self.write_output.read().await {
            return;
        }
        if let Some(output) = invocation.args.last() {
            let _ = tokio::fs::write(PathBuf::from(output), b"mock output").await;
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
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

        self.invocations.write().await.push(invocation.clone());

        let run = match self.scripts.read().await.get(&invocation.label) {
            Some(run) => run.clone(),
            None => self.default_run.read().await.clone(),
        };

        match run {
            ScriptedRun::NotFound => Err(TranscodeError::NotFound {
                path: invocation.program.clone(),
            }),
            ScriptedRun::UntilCancelled { lines } => {
                for line in &lines {
                    on_line(line);
                }
                self.touch_output(invocation).await;
                cancel.cancelled().await;
                Err(TranscodeError::Cancelled)
            }
            ScriptedRun::Exit { code, lines } => {
                for line in &lines {
                    on_line(line);
                }
                self.touch_output(invocation).await;

                let duration_ms = *self.run_duration_ms.read().await;
                if duration_ms > 0 {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => {}
                        _ = cancel.cancelled() => return Err(TranscodeError::Cancelled),
                    }
                }

                Ok(TranscodeExit::new(Some(code), lines))
            }
        }
    }
}
