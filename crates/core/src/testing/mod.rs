//! Test doubles for the prober and transcoder seams.
//!
//! These let the fallback chain and the batch orchestrator be exercised
//! without ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use looper_core::testing::{fixtures, MockProber, MockTranscoder, ScriptedRun};
//!
//! let prober = MockProber::new();
//! prober.add_video(fixtures::clip("/clips/wave.mp4", 20.0, 30.0)).await;
//!
//! let transcoder = MockTranscoder::new();
//! transcoder.script("composite_loop", ScriptedRun::fail(1)).await;
//! ```

mod mock_prober;
mod mock_transcoder;

pub use mock_prober::MockProber;
pub use mock_transcoder::{MockTranscoder, ScriptedRun};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::PathBuf;

    use crate::capability::EncoderCapability;
    use crate::loop_filter::{LoopParameters, OutputCodec, Overlap};
    use crate::media::VideoDescriptor;

    /// A 1080p clip of the given length and frame rate.
    pub fn clip(path: &str, duration_secs: f64, frame_rate: f64) -> VideoDescriptor {
        let frames = (duration_secs * frame_rate).round() as u64;
        VideoDescriptor::new(path, frame_rate, frames, 1920, 1080, 25 * 1024 * 1024)
    }

    /// One-second crossfade to HAP.
    pub fn hap_params() -> LoopParameters {
        LoopParameters::new(Overlap::Seconds(1.0), OutputCodec::Hap)
    }

    /// One-second crossfade to MP4 at the default quality.
    pub fn mp4_params() -> LoopParameters {
        LoopParameters::new(Overlap::Seconds(1.0), OutputCodec::Mp4 { quality: 18 })
    }

    /// A probed transcoder that has both HAP and H.264 encoders.
    pub fn full_capability() -> EncoderCapability {
        let mut capability =
            EncoderCapability::new(PathBuf::from("/usr/bin/ffmpeg")).with_encoders(["hap", "libx264"]);
        capability.version = Some("ffmpeg version 6.1".to_string());
        capability
    }

    /// A probed transcoder with H.264 only.
    pub fn x264_only_capability() -> EncoderCapability {
        EncoderCapability::new(PathBuf::from("/usr/bin/ffmpeg")).with_encoders(["libx264"])
    }
}
