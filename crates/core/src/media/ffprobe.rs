//! FFprobe-based media prober.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::error::ProbeError;
use super::traits::MediaProber;
use super::types::VideoDescriptor;

/// Probes source files by running ffprobe and reading its JSON report.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Creates a prober that runs the given ffprobe binary.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Creates a prober that resolves `ffprobe` from the runtime search path.
    pub fn with_defaults() -> Self {
        Self::new("ffprobe")
    }

    /// Parses ffprobe JSON output into a descriptor.
    ///
    /// `size_bytes` comes from the filesystem, not from the report.
    fn parse_probe_output(
        path: &Path,
        output: &str,
        size_bytes: u64,
    ) -> Result<VideoDescriptor, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            #[serde(default)]
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
            avg_frame_rate: Option<String>,
            nb_frames: Option<String>,
            duration: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ProbeError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let video = probe
            .streams
            .iter()
            .find(|s| s.codec_type == "video")
            .ok_or_else(|| ProbeError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        // Some containers report 0/0 for r_frame_rate but a usable average.
        let frame_rate = video
            .r_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| video.avg_frame_rate.as_deref().and_then(parse_frame_rate))
            .unwrap_or(0.0);

        let duration_secs = video
            .duration
            .as_deref()
            .or_else(|| probe.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|d| d.parse::<f64>().ok());

        let frame_count = video
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .or_else(|| match duration_secs {
                Some(d) if d > 0.0 && frame_rate > 0.0 => Some((d * frame_rate).round() as u64),
                _ => None,
            })
            .unwrap_or(0);

        Ok(VideoDescriptor {
            path: path.to_path_buf(),
            frame_rate,
            frame_count,
            width: video.width.unwrap_or(0),
            height: video.height.unwrap_or(0),
            size_bytes,
        })
    }
}

/// Parses a frame rate like "24000/1001", "30/1" or "25".
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den > 0.0 {
                num / den
            } else {
                return None;
            }
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (value > 0.0).then_some(value)
}

#[async_trait]
impl MediaProber for FfprobeProber {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<VideoDescriptor, ProbeError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            _ => {
                return Err(ProbeError::SourceNotFound {
                    path: path.to_path_buf(),
                })
            }
        };

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::unreadable(
                path,
                format!("ffprobe exited with code: {:?}", output.status.code()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout, metadata.len())
    }
}
