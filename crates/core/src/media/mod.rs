//! Media probing.
//!
//! A `MediaProber` turns a source path into an immutable `VideoDescriptor`.
//! The batch orchestrator probes every queued file once, before any
//! transcoding starts; files that cannot be probed are dropped from the
//! batch.

mod error;
mod ffprobe;
mod traits;
mod types;

pub use error::ProbeError;
pub use ffprobe::FfprobeProber;
pub use traits::MediaProber;
pub use types::VideoDescriptor;
