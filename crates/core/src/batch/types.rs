//! Types for the batch module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::chain::{JobOutcome, Strategy};

use super::error::BatchAbort;

/// Progress of the job currently running.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    /// Zero-based position of the job in the batch.
    pub index: usize,
    pub total: usize,
    pub filename: String,
    /// Rung producing this update.
    pub strategy: Strategy,
    pub percent: f32,
}

/// One finished job in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub filename: String,
    pub output_path: PathBuf,
    pub outcome: JobOutcome,
}

/// Per-file outcomes of one batch, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub entries: Vec<ReportEntry>,
    /// Sources left out because they could not be probed.
    pub skipped: usize,
    /// Whether the batch was cancelled before every job ran.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(batch_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            entries: Vec::new(),
            skipped: 0,
            cancelled: false,
            started_at,
            finished_at: started_at,
        }
    }

    /// Filenames whose job produced output.
    pub fn succeeded(&self) -> Vec<&str> {
        self.filenames_where(JobOutcome::is_success)
    }

    /// Filenames whose job exhausted every strategy.
    pub fn failed(&self) -> Vec<&str> {
        self.filenames_where(JobOutcome::is_failure)
    }

    /// Whether every source produced output.
    ///
    /// False for an empty report and when any source was skipped.
    pub fn all_succeeded(&self) -> bool {
        !self.cancelled
            && self.skipped == 0
            && !self.entries.is_empty()
            && self.entries.iter().all(|e| e.outcome.is_success())
    }

    pub fn elapsed_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Human-readable completion summary.
    pub fn summary(&self) -> String {
        let failed = self.failed();
        let mut out = String::new();
        if self.cancelled {
            out.push_str("Batch processing cancelled.\n\n");
        } else {
            out.push_str("Batch processing complete!\n\n");
        }
        let _ = writeln!(
            out,
            "Successfully processed: {} files",
            self.succeeded().len()
        );
        if self.skipped > 0 {
            let _ = writeln!(out, "Skipped unreadable: {} files", self.skipped);
        }
        if !failed.is_empty() {
            let _ = writeln!(out, "Failed to process: {} files", failed.len());
            let _ = write!(out, "\nFailed files:\n{}\n", failed.join("\n"));
        }
        out
    }

    fn filenames_where(&self, pred: impl Fn(&JobOutcome) -> bool) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| pred(&e.outcome))
            .map(|e| e.filename.as_str())
            .collect()
    }
}

/// Messages from the batch worker to its caller, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// Pre-flight passed; `total` jobs will run.
    Started { batch_id: String, total: usize },
    /// A job made progress.
    Progress(BatchProgress),
    /// A job reached its terminal outcome.
    JobFinished {
        index: usize,
        total: usize,
        filename: String,
        outcome: JobOutcome,
    },
    /// Pre-flight failed; no job ran.
    Aborted(BatchAbort),
    /// Every job has a terminal outcome, or the batch was cancelled.
    Completed(BatchReport),
}

impl BatchEvent {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted(_) | Self::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StrategyFailure;

    fn entry(filename: &str, outcome: JobOutcome) -> ReportEntry {
        ReportEntry {
            filename: filename.to_string(),
            output_path: PathBuf::from(format!("/out/{}", filename)),
            outcome,
        }
    }

    #[test]
    fn test_summary_lists_failed_files() {
        let mut report = BatchReport::new("b1".to_string(), Utc::now());
        report.entries.push(entry(
            "a.mp4",
            JobOutcome::Succeeded {
                strategy: Strategy::CompositeLoop,
            },
        ));
        report.entries.push(entry(
            "b.mp4",
            JobOutcome::Failed {
                attempts: vec![StrategyFailure {
                    strategy: Strategy::PassThrough,
                    reason: "Transcoder exited with code: Some(1)".to_string(),
                    diagnostics: vec!["moov atom not found".to_string()],
                }],
            },
        ));

        assert_eq!(report.succeeded(), vec!["a.mp4"]);
        assert_eq!(report.failed(), vec!["b.mp4"]);
        assert!(!report.all_succeeded());

        let summary = report.summary();
        assert!(summary.starts_with("Batch processing complete!"));
        assert!(summary.contains("Successfully processed: 1 files"));
        assert!(summary.contains("Failed to process: 1 files"));
        assert!(summary.contains("Failed files:\nb.mp4"));
        assert!(!summary.contains("moov atom"));
    }

    #[test]
    fn test_cancelled_report() {
        let mut report = BatchReport::new("b2".to_string(), Utc::now());
        report.entries.push(entry("a.mp4", JobOutcome::Cancelled));
        report.cancelled = true;

        assert!(report.succeeded().is_empty());
        assert!(report.failed().is_empty());
        assert!(!report.all_succeeded());
        assert!(report.summary().starts_with("Batch processing cancelled."));
    }

    #[test]
    fn test_empty_or_skipping_report_is_not_a_success() {
        let mut report = BatchReport::new("b4".to_string(), Utc::now());
        assert!(!report.all_succeeded());

        report.skipped = 1;
        assert!(!report.all_succeeded());
        assert!(report.summary().contains("Skipped unreadable: 1 files"));

        report.entries.push(entry(
            "a.mp4",
            JobOutcome::Succeeded {
                strategy: Strategy::SimpleRepeat,
            },
        ));
        assert!(!report.all_succeeded());

        report.skipped = 0;
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_terminal_events() {
        let report = BatchReport::new("b3".to_string(), Utc::now());
        assert!(BatchEvent::Completed(report).is_terminal());
        assert!(!BatchEvent::Started {
            batch_id: "b3".to_string(),
            total: 0
        }
        .is_terminal());
    }
}
