//! Terminal rendering of batch events.

use std::io::Write;

use serde_json::{json, Value};

use looper_core::{BatchAbort, BatchEvent, JobOutcome};

/// Prints batch events as text or JSON lines.
pub struct EventPrinter {
    json: bool,
    /// Last (job index, whole percent) printed, to avoid repainting.
    last_progress: Option<(usize, u32)>,
}

impl EventPrinter {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            last_progress: None,
        }
    }

    pub fn print(&mut self, event: &BatchEvent) {
        if self.json {
            match event_json(event) {
                Ok(value) => println!("{}", value),
                Err(e) => tracing::warn!("Cannot serialize batch event: {}", e),
            }
            return;
        }

        match event {
            BatchEvent::Started { total, .. } => {
                println!("Processing {} file{}", total, if *total == 1 { "" } else { "s" });
            }
            BatchEvent::Progress(progress) => {
                let whole = progress.percent as u32;
                if self.last_progress == Some((progress.index, whole)) {
                    return;
                }
                self.last_progress = Some((progress.index, whole));
                let mut stdout = std::io::stdout();
                let _ = write!(
                    stdout,
                    "\r[{}/{}] {}: {} {:>3}%",
                    progress.index + 1,
                    progress.total,
                    progress.filename,
                    progress.strategy,
                    whole
                );
                let _ = stdout.flush();
            }
            BatchEvent::JobFinished {
                index,
                total,
                filename,
                outcome,
            } => {
                // Terminate the progress line, if one was painted.
                if self.last_progress.map(|(i, _)| i) == Some(*index) {
                    println!();
                }
                println!("[{}/{}] {}: {}", index + 1, total, filename, outcome_text(outcome));
            }
            BatchEvent::Aborted(abort) => {
                eprintln!("Batch aborted: {}", abort);
                if abort.offers_install() {
                    eprintln!("Run `looper install`, or pass --install to retry after installing.");
                }
            }
            BatchEvent::Completed(report) => {
                println!();
                print!("{}", report.summary());
                println!("Elapsed: {}s", report.elapsed_secs());
            }
        }
    }
}

/// JSON form of an event. The completion event also lists the succeeded
/// and failed filenames.
fn event_json(event: &BatchEvent) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(event)?;
    if let (BatchEvent::Completed(report), Value::Object(fields)) = (event, &mut value) {
        fields.insert("succeeded".to_string(), json!(report.succeeded()));
        fields.insert("failed".to_string(), json!(report.failed()));
    }
    Ok(value)
}

fn outcome_text(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Succeeded { strategy } => format!("done ({})", strategy),
        JobOutcome::Failed { .. } => "failed".to_string(),
        JobOutcome::Cancelled => "cancelled".to_string(),
    }
}

/// Whether the abort could be fixed by installing FFmpeg.
pub fn wants_install(event: &BatchEvent) -> bool {
    matches!(event, BatchEvent::Aborted(abort) if abort.offers_install())
}

/// Exit status for a terminal event.
pub fn exit_status(event: Option<&BatchEvent>) -> i32 {
    match event {
        Some(BatchEvent::Completed(report)) if report.all_succeeded() => 0,
        Some(BatchEvent::Aborted(
            BatchAbort::CapabilityUnready(_) | BatchAbort::ProberMissing { .. },
        )) => 3,
        _ => 1,
    }
}
