//! Transcoder progress parsing.
//!
//! ffmpeg rewrites a stats line such as
//! `frame=  240 fps= 60 q=23.0 size=  1024kB time=00:00:08.00 bitrate=...`
//! while it encodes. A line carrying `time=HH:MM:SS.ff` or `frame=N` is
//! progress-bearing; anything else is diagnostic noise.
//!
//! Percentages are capped at 95. The fallback chain reports 100 itself once
//! a strategy exits successfully.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

/// Highest percentage inferred from transcoder output.
pub const MAX_REPORTED_PERCENT: f32 = 95.0;

/// Percentage reported once a strategy finishes successfully.
pub const FINISHED_PERCENT: f32 = 100.0;

static TIME_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time=(\d{2,}):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid time marker regex")
});

static FRAME_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"frame=\s*(\d+)").expect("valid frame marker regex"));

/// Expected size of the output a strategy produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressTarget {
    pub duration_secs: f64,
    pub frame_count: u64,
}

impl ProgressTarget {
    pub fn new(duration_secs: f64, frame_count: u64) -> Self {
        Self {
            duration_secs,
            frame_count,
        }
    }
}

/// Which marker a percentage was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBasis {
    Time,
    Frames,
}

/// One parsed progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressReading {
    pub basis: ProgressBasis,
    pub percent: f32,
}

/// Elapsed output time in seconds from a `time=` marker.
pub fn parse_time_marker(line: &str) -> Option<f64> {
    let caps = TIME_MARKER.captures(line)?;
    let hours = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let minutes = caps.get(2)?.as_str().parse::<f64>().ok()?;
    let seconds = caps.get(3)?.as_str().parse::<f64>().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Frames written so far from a `frame=` marker.
pub fn parse_frame_marker(line: &str) -> Option<u64> {
    FRAME_MARKER.captures(line)?.get(1)?.as_str().parse().ok()
}

fn to_percent(done: f64, total: f64) -> f32 {
    ((done / total) * 100.0).clamp(0.0, MAX_REPORTED_PERCENT as f64) as f32
}

fn reading_from(line: &str, basis: ProgressBasis, target: &ProgressTarget) -> Option<ProgressReading> {
    let percent = match basis {
        ProgressBasis::Time if target.duration_secs > 0.0 => {
            to_percent(parse_time_marker(line)?, target.duration_secs)
        }
        ProgressBasis::Frames if target.frame_count > 0 => {
            to_percent(parse_frame_marker(line)? as f64, target.frame_count as f64)
        }
        _ => return None,
    };
    Some(ProgressReading { basis, percent })
}

/// Translates one line of transcoder output into a percentage.
///
/// The time marker wins when present and the target duration is known;
/// the frame marker is the fallback. Returns `None` for noise.
pub fn parse_progress(line: &str, target: &ProgressTarget) -> Option<ProgressReading> {
    reading_from(line, ProgressBasis::Time, target)
        .or_else(|| reading_from(line, ProgressBasis::Frames, target))
}

/// Per-strategy progress state.
///
/// Locks onto the first marker kind that produced a value, so time- and
/// frame-derived estimates are never mixed, and only reports increases.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    target: ProgressTarget,
    basis: Option<ProgressBasis>,
    last_percent: f32,
}

impl ProgressTracker {
    pub fn new(target: ProgressTarget) -> Self {
        Self {
            target,
            basis: None,
            last_percent: 0.0,
        }
    }

    /// Feeds one line; returns the new percentage if it moved forward.
    pub fn observe(&mut self, line: &str) -> Option<f32> {
        let reading = match self.basis {
            Some(basis) => reading_from(line, basis, &self.target)?,
            None => parse_progress(line, &self.target)?,
        };
        self.basis.get_or_insert(reading.basis);

        if reading.percent > self.last_percent {
            self.last_percent = reading.percent;
            Some(reading.percent)
        } else {
            None
        }
    }

    /// Marker kind this tracker locked onto, if any.
    pub fn basis(&self) -> Option<ProgressBasis> {
        self.basis
    }

    /// Last reported percentage.
    pub fn last_percent(&self) -> f32 {
        self.last_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str =
        "frame=  150 fps= 60 q=23.0 size=    512kB time=00:00:05.00 bitrate= 838.9kbits/s speed=2.01x";

    #[test]
    fn test_parse_time_marker() {
        assert_eq!(parse_time_marker(STATS), Some(5.0));
        assert_eq!(parse_time_marker("time=01:02:03.50"), Some(3723.5));
        assert_eq!(parse_time_marker("time=N/A bitrate=N/A"), None);
        assert_eq!(parse_time_marker("Stream mapping:"), None);
    }

    #[test]
    fn test_parse_frame_marker() {
        assert_eq!(parse_frame_marker(STATS), Some(150));
        assert_eq!(parse_frame_marker("frame=42"), Some(42));
        assert_eq!(parse_frame_marker("[hap @ 0x55] warning"), None);
    }

    #[test]
    fn test_time_marker_preferred() {
        let target = ProgressTarget::new(20.0, 300);
        let reading = parse_progress(STATS, &target).unwrap();
        assert_eq!(reading.basis, ProgressBasis::Time);
        assert!((reading.percent - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_frame_marker_fallback() {
        let target = ProgressTarget::new(0.0, 300);
        let reading = parse_progress(STATS, &target).unwrap();
        assert_eq!(reading.basis, ProgressBasis::Frames);
        assert!((reading.percent - 50.0).abs() < 1e-4);

        let target = ProgressTarget::new(20.0, 300);
        let reading = parse_progress("frame=  30 fps=0.0", &target).unwrap();
        assert_eq!(reading.basis, ProgressBasis::Frames);
    }

    #[test]
    fn test_noise_is_ignored() {
        let target = ProgressTarget::new(20.0, 600);
        assert_eq!(parse_progress("Press [q] to stop, [?] for help", &target), None);
        assert_eq!(parse_progress("", &target), None);
    }

    #[test]
    fn test_capped_at_95() {
        let target = ProgressTarget::new(10.0, 300);
        let reading = parse_progress("time=00:00:12.00", &target).unwrap();
        assert_eq!(reading.percent, MAX_REPORTED_PERCENT);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let target = ProgressTarget::new(20.0, 600);
        assert_eq!(parse_progress(STATS, &target), parse_progress(STATS, &target));
    }

    #[test]
    fn test_tracker_non_decreasing_and_capped() {
        let mut tracker = ProgressTracker::new(ProgressTarget::new(18.0, 540));
        let mut reported = Vec::new();
        for secs in [0u32, 2, 4, 4, 9, 13, 17, 18, 19] {
            let line = format!("frame=1 time=00:00:{:02}.00 bitrate=1k", secs);
            if let Some(p) = tracker.observe(&line) {
                reported.push(p);
            }
        }

        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert!(reported.iter().all(|p| *p <= MAX_REPORTED_PERCENT));
        assert_eq!(*reported.last().unwrap(), MAX_REPORTED_PERCENT);
        assert_eq!(tracker.basis(), Some(ProgressBasis::Time));
    }

    #[test]
    fn test_tracker_does_not_mix_markers() {
        let mut tracker = ProgressTracker::new(ProgressTarget::new(20.0, 100));
        assert!(tracker.observe("frame=10 time=00:00:02.00").is_some());
        assert!((tracker.last_percent() - 10.0).abs() < 1e-4);

        // A frame-only line would claim 90%; the tracker is locked to time.
        assert_eq!(tracker.observe("frame=90"), None);
        assert!((tracker.last_percent() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_tracker_ignores_regressions() {
        let mut tracker = ProgressTracker::new(ProgressTarget::new(10.0, 0));
        assert!(tracker.observe("time=00:00:05.00").is_some());
        assert_eq!(tracker.observe("time=00:00:03.00"), None);
        assert_eq!(tracker.last_percent(), 50.0);
    }
}
