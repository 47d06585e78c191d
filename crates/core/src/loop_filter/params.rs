//! Loop parameters and the output codec table.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::media::VideoDescriptor;

/// Highest accepted quality value (x264 CRF scale, lower is better).
pub const MAX_QUALITY: u8 = 51;

/// Invalid user-supplied loop parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("overlap must be greater than zero, got {0}")]
    NonPositiveOverlap(String),

    #[error("quality must be between 0 and {max}, got {value}")]
    QualityOutOfRange { value: u8, max: u8 },
}

/// How much of the clip's tail blends into its head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum Overlap {
    Seconds(f64),
    Frames(u32),
}

impl Overlap {
    /// Normalizes the overlap to seconds at the given frame rate.
    pub fn to_seconds(&self, frame_rate: f64) -> f64 {
        match *self {
            Self::Seconds(secs) => secs,
            Self::Frames(frames) if frame_rate > 0.0 => frames as f64 / frame_rate,
            Self::Frames(_) => 0.0,
        }
    }

    fn validate(&self) -> Result<(), ParameterError> {
        match *self {
            Self::Seconds(secs) if secs <= 0.0 || !secs.is_finite() => {
                Err(ParameterError::NonPositiveOverlap(format!("{}s", secs)))
            }
            Self::Frames(0) => Err(ParameterError::NonPositiveOverlap("0 frames".to_string())),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(secs) => write!(f, "{}s", secs),
            Self::Frames(frames) => write!(f, "{} frames", frames),
        }
    }
}

/// Encoder, container and quality flags for one output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecProfile {
    /// User-facing family name.
    pub family: &'static str,
    /// ffmpeg encoder passed to `-c:v`.
    pub encoder: &'static str,
    /// Name searched for in the `-encoders` listing.
    pub probe_name: &'static str,
    /// Suffixed encoder variants that also count as present.
    pub probe_variants: &'static [&'static str],
    /// Output file extension.
    pub container: &'static str,
    /// Encoder speed preset, if the encoder takes one.
    pub preset: Option<&'static str>,
    /// Whether the encoder honours `-crf`.
    pub takes_quality: bool,
    /// Pixel format passed to `-pix_fmt`.
    pub pixel_format: &'static str,
}

/// Visually lossless intraframe codec for media servers.
pub const HAP_PROFILE: CodecProfile = CodecProfile {
    family: "HAP",
    encoder: "hap",
    probe_name: "hap",
    probe_variants: &["hap_alpha", "hap_q", "hap_hq"],
    container: "mov",
    preset: None,
    takes_quality: false,
    pixel_format: "rgb0",
};

/// H.264 delivery codec.
pub const MP4_PROFILE: CodecProfile = CodecProfile {
    family: "MP4",
    encoder: "libx264",
    probe_name: "libx264",
    probe_variants: &[],
    container: "mp4",
    preset: Some("fast"),
    takes_quality: true,
    pixel_format: "yuv420p",
};

/// Output codec selected for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "codec", rename_all = "snake_case")]
pub enum OutputCodec {
    Hap,
    Mp4 { quality: u8 },
}

impl OutputCodec {
    /// Looks up the codec's profile.
    pub fn profile(&self) -> &'static CodecProfile {
        match self {
            Self::Hap => &HAP_PROFILE,
            Self::Mp4 { .. } => &MP4_PROFILE,
        }
    }

    /// Quality knob, for codecs that have one.
    pub fn quality(&self) -> Option<u8> {
        match self {
            Self::Hap => None,
            Self::Mp4 { quality } => Some(*quality),
        }
    }

    fn validate(&self) -> Result<(), ParameterError> {
        match self.quality() {
            Some(value) if value > MAX_QUALITY => Err(ParameterError::QualityOutOfRange {
                value,
                max: MAX_QUALITY,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for OutputCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().family)
    }
}

/// User-supplied parameters shared by every job in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopParameters {
    pub overlap: Overlap,
    pub codec: OutputCodec,
}

impl LoopParameters {
    pub fn new(overlap: Overlap, codec: OutputCodec) -> Self {
        Self { overlap, codec }
    }

    /// Checks the overlap is positive and the quality in range.
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.overlap.validate()?;
        self.codec.validate()
    }

    /// Overlap in seconds for one source, before any clamping.
    pub fn overlap_secs_for(&self, video: &VideoDescriptor) -> f64 {
        self.overlap.to_seconds(video.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_to_seconds() {
        assert_eq!(Overlap::Seconds(1.5).to_seconds(30.0), 1.5);
        assert_eq!(Overlap::Frames(60).to_seconds(30.0), 2.0);
        assert_eq!(Overlap::Frames(60).to_seconds(0.0), 0.0);
    }

    #[test]
    fn test_validate_overlap() {
        let codec = OutputCodec::Mp4 { quality: 18 };
        assert!(LoopParameters::new(Overlap::Seconds(1.0), codec).validate().is_ok());
        assert!(LoopParameters::new(Overlap::Frames(12), codec).validate().is_ok());
        assert!(matches!(
            LoopParameters::new(Overlap::Seconds(0.0), codec).validate(),
            Err(ParameterError::NonPositiveOverlap(_))
        ));
        assert!(LoopParameters::new(Overlap::Seconds(-2.0), codec).validate().is_err());
        assert!(LoopParameters::new(Overlap::Seconds(f64::NAN), codec).validate().is_err());
        assert!(LoopParameters::new(Overlap::Frames(0), codec).validate().is_err());
    }

    #[test]
    fn test_validate_quality() {
        let ok = LoopParameters::new(Overlap::Seconds(1.0), OutputCodec::Mp4 { quality: 51 });
        assert!(ok.validate().is_ok());

        let bad = LoopParameters::new(Overlap::Seconds(1.0), OutputCodec::Mp4 { quality: 52 });
        assert_eq!(
            bad.validate(),
            Err(ParameterError::QualityOutOfRange { value: 52, max: 51 })
        );
    }

    #[test]
    fn test_codec_table() {
        assert_eq!(OutputCodec::Hap.profile().encoder, "hap");
        assert_eq!(OutputCodec::Hap.profile().container, "mov");
        assert_eq!(OutputCodec::Hap.quality(), None);

        let mp4 = OutputCodec::Mp4 { quality: 23 };
        assert_eq!(mp4.profile().encoder, "libx264");
        assert_eq!(mp4.profile().container, "mp4");
        assert_eq!(mp4.profile().preset, Some("fast"));
        assert_eq!(mp4.quality(), Some(23));
        assert_eq!(mp4.to_string(), "MP4");
    }

    #[test]
    fn test_overlap_for_descriptor() {
        let video = VideoDescriptor::new("/clips/a.mov", 25.0, 250, 640, 480, 0);
        let params = LoopParameters::new(Overlap::Frames(50), OutputCodec::Hap);
        assert_eq!(params.overlap_secs_for(&video), 2.0);
    }

    #[test]
    fn test_serde_shape() {
        let params = LoopParameters::new(Overlap::Seconds(1.0), OutputCodec::Mp4 { quality: 18 });
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["overlap"]["unit"], "seconds");
        assert_eq!(json["codec"]["codec"], "mp4");
        assert_eq!(json["codec"]["quality"], 18);
    }
}
