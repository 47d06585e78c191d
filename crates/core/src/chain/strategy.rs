//! The three rungs of the fallback ladder and their argument lists.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::loop_filter::{build_loop_graph, fmt_secs, CodecProfile, LOOP_OUTPUT_LABEL};
use crate::progress::ProgressTarget;

use super::error::RungError;
use super::types::TranscodeJob;

/// Quality used by the pass-through rung, regardless of the user's setting.
pub const PASSTHROUGH_QUALITY: u8 = 18;

/// One way of producing a job's output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Tail crossfaded over the head.
    CompositeLoop,
    /// The clip played twice back to back, hard cut.
    SimpleRepeat,
    /// The clip re-encoded unchanged.
    PassThrough,
}

impl Strategy {
    /// Rungs in the order they are tried.
    pub const LADDER: [Strategy; 3] = [
        Strategy::CompositeLoop,
        Strategy::SimpleRepeat,
        Strategy::PassThrough,
    ];

    /// Short identifier used in logs and invocation labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CompositeLoop => "composite_loop",
            Self::SimpleRepeat => "simple_repeat",
            Self::PassThrough => "pass_through",
        }
    }

    /// Transcoder arguments for this rung, input to output.
    pub fn build_args(&self, job: &TranscodeJob) -> Result<Vec<String>, RungError> {
        let video = &job.video;
        let total_secs = video.duration_secs();
        let input = video.path.to_string_lossy().to_string();
        let profile = job.params.codec.profile();

        let mut args = vec!["-y".to_string()];
        match self {
            Self::CompositeLoop => {
                if total_secs <= 0.0 {
                    return Err(RungError::degenerate("source has no measurable duration"));
                }
                let graph = build_loop_graph(
                    job.params.overlap_secs_for(video),
                    total_secs,
                    video.frame_rate,
                );
                args.extend(strings(&[
                    "-i",
                    &input,
                    "-filter_complex",
                    graph.description(),
                    "-map",
                    LOOP_OUTPUT_LABEL,
                ]));
                args.extend(codec_args(profile, job.params.codec.quality()));
            }
            Self::SimpleRepeat => {
                if total_secs <= 0.0 {
                    return Err(RungError::degenerate("source has no measurable duration"));
                }
                args.extend(strings(&[
                    "-stream_loop",
                    "1",
                    "-i",
                    &input,
                    "-t",
                    &fmt_secs(total_secs * 2.0),
                    "-an",
                ]));
                args.extend(codec_args(profile, job.params.codec.quality()));
            }
            Self::PassThrough => {
                args.extend(strings(&["-i", &input, "-an"]));
                args.extend(codec_args(profile, Some(PASSTHROUGH_QUALITY)));
            }
        }
        args.push(job.output_path.to_string_lossy().to_string());
        Ok(args)
    }

    /// Expected output length, for turning markers into percentages.
    pub fn progress_target(&self, job: &TranscodeJob) -> ProgressTarget {
        let video = &job.video;
        match self {
            Self::CompositeLoop => {
                let graph = build_loop_graph(
                    job.params.overlap_secs_for(video),
                    video.duration_secs(),
                    video.frame_rate,
                );
                let frames = (graph.base_duration_secs * video.frame_rate).round().max(0.0);
                ProgressTarget::new(graph.base_duration_secs, frames as u64)
            }
            Self::SimpleRepeat => {
                ProgressTarget::new(video.duration_secs() * 2.0, video.frame_count * 2)
            }
            Self::PassThrough => ProgressTarget::new(video.duration_secs(), video.frame_count),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CompositeLoop => "composite loop",
            Self::SimpleRepeat => "simple repeat",
            Self::PassThrough => "pass-through",
        })
    }
}

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Encoder, preset, quality and pixel format flags for a codec profile.
fn codec_args(profile: &CodecProfile, quality: Option<u8>) -> Vec<String> {
    let mut args = strings(&["-c:v", profile.encoder]);
    if let Some(preset) = profile.preset {
        args.extend(strings(&["-preset", preset]));
    }
    if let (true, Some(quality)) = (profile.takes_quality, quality) {
        args.push("-crf".to_string());
        args.push(quality.to_string());
    }
    args.extend(strings(&["-pix_fmt", profile.pixel_format]));
    args
}
