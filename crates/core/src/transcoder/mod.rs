//! External transcoder invocation.
//!
//! A `Transcoder` runs one ffmpeg process to completion: it streams the
//! process's diagnostic output line by line to a callback, keeps a tail of
//! it for postmortems, and reports the exit status. It knows nothing about
//! loops or fallbacks; the fallback chain decides which arguments to pass.

mod config;
mod error;
mod ffmpeg;
mod lines;
mod traits;
mod types;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{TranscodeExit, TranscodeInvocation, DIAGNOSTIC_TAIL_LINES};
