//! Seamless video loops, batch transcoded through ffmpeg.
//!
//! The pieces, leaf first:
//! - [`progress`]: transcoder stats lines to percentages
//! - [`loop_filter`]: the crossfade filter graph and codec table
//! - [`capability`]: finding ffmpeg and checking its encoders
//! - [`chain`]: the three-rung strategy ladder per file
//! - [`batch`]: sequential batches with ordered events

pub mod batch;
pub mod capability;
pub mod chain;
pub mod config;
pub mod loop_filter;
pub mod media;
pub mod progress;
pub mod testing;
pub mod transcoder;

pub use batch::{
    BatchAbort, BatchConfig, BatchError, BatchEvent, BatchHandle, BatchOrchestrator,
    BatchProgress, BatchReport, ReportEntry,
};
pub use capability::{CapabilityError, CapabilityGate, EncoderCapability, InstallReason, Readiness};
pub use chain::{JobOutcome, Strategy, TranscodeFallbackChain, TranscodeJob};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LoopDefaults,
};
pub use loop_filter::{build_loop_graph, LoopGraph, LoopParameters, OutputCodec, Overlap};
pub use media::{FfprobeProber, MediaProber, ProbeError, VideoDescriptor};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig};
