//! Types for the transcoder module.

use serde::Serialize;
use std::path::PathBuf;

/// Number of trailing diagnostic lines kept from each run.
pub const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// One transcoder process to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscodeInvocation {
    /// Short name of the step, used in logs.
    pub label: String,
    /// Resolved transcoder binary.
    pub program: PathBuf,
    /// Arguments after the program name.
    pub args: Vec<String>,
}

impl TranscodeInvocation {
    pub fn new(label: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args,
        }
    }

    /// Shell-like rendering for debug logs.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().to_string()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(' ') || a.contains(';') {
                format!("\"{}\"", a)
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }
}

/// How a transcoder process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscodeExit {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Last lines of diagnostic output.
    pub diagnostics: Vec<String>,
}

impl TranscodeExit {
    pub fn new(code: Option<i32>, diagnostics: Vec<String>) -> Self {
        Self { code, diagnostics }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Diagnostics joined for a log record.
    pub fn diagnostic_text(&self) -> String {
        self.diagnostics.join("\n")
    }
}
