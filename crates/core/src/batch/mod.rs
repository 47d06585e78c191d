//! Batch orchestration.
//!
//! A batch is one request: a list of sources (files or directories of
//! videos), one set of loop parameters and an output directory. It moves
//! through `Idle → Running → Completed`; pre-flight failures end it with an
//! `Aborted` event before any file is touched, while per-file failures are
//! only recorded in the report.

mod config;
mod error;
mod runner;
mod sources;
mod types;

pub use config::BatchConfig;
pub use error::{BatchAbort, BatchError};
pub use runner::{BatchHandle, BatchOrchestrator};
pub use sources::{expand_sources, plan_output_path};
pub use types::{BatchEvent, BatchProgress, BatchReport, ReportEntry};
