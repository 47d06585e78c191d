use serde::{Deserialize, Serialize};

use crate::batch::BatchConfig;
use crate::loop_filter::{LoopParameters, OutputCodec, Overlap};
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default)]
    pub defaults: LoopDefaults,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Unit of the default overlap amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapUnit {
    Seconds,
    Frames,
}

/// Codec family selected by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecChoice {
    Hap,
    Mp4,
}

/// Loop settings used when the caller does not override them
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoopDefaults {
    #[serde(default = "default_overlap")]
    pub overlap: f64,
    #[serde(default = "default_overlap_unit")]
    pub overlap_unit: OverlapUnit,
    #[serde(default = "default_codec")]
    pub codec: CodecChoice,
    /// MP4 quality (CRF, 0-51, lower is better)
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for LoopDefaults {
    fn default() -> Self {
        Self {
            overlap: default_overlap(),
            overlap_unit: default_overlap_unit(),
            codec: default_codec(),
            quality: default_quality(),
        }
    }
}

fn default_overlap() -> f64 {
    1.0
}

fn default_overlap_unit() -> OverlapUnit {
    OverlapUnit::Seconds
}

fn default_codec() -> CodecChoice {
    CodecChoice::Hap
}

fn default_quality() -> u8 {
    18
}

impl LoopDefaults {
    /// The overlap in its configured unit. Frame counts are rounded.
    pub fn overlap(&self) -> Overlap {
        match self.overlap_unit {
            OverlapUnit::Seconds => Overlap::Seconds(self.overlap),
            OverlapUnit::Frames => Overlap::Frames(self.overlap.round().max(0.0) as u32),
        }
    }

    pub fn codec(&self) -> OutputCodec {
        match self.codec {
            CodecChoice::Hap => OutputCodec::Hap,
            CodecChoice::Mp4 => OutputCodec::Mp4 {
                quality: self.quality,
            },
        }
    }

    pub fn to_parameters(&self) -> LoopParameters {
        LoopParameters::new(self.overlap(), self.codec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.overlap, 1.0);
        assert_eq!(config.defaults.overlap_unit, OverlapUnit::Seconds);
        assert_eq!(config.defaults.codec, CodecChoice::Hap);
        assert_eq!(config.defaults.quality, 18);
        assert_eq!(config.batch.output_suffix, "_LOOPER");
    }

    #[test]
    fn test_defaults_to_parameters() {
        let defaults = LoopDefaults {
            overlap: 12.0,
            overlap_unit: OverlapUnit::Frames,
            codec: CodecChoice::Mp4,
            quality: 23,
        };
        let params = defaults.to_parameters();
        assert_eq!(params.overlap, Overlap::Frames(12));
        assert_eq!(params.codec, OutputCodec::Mp4 { quality: 23 });

        let params = LoopDefaults::default().to_parameters();
        assert_eq!(params.overlap, Overlap::Seconds(1.0));
        assert_eq!(params.codec, OutputCodec::Hap);
    }
}
