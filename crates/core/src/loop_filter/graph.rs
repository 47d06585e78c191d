//! Loop filter-graph builder.

use serde::Serialize;

use super::fmt_secs;

/// Label of the single output stream the loop graph produces.
pub const LOOP_OUTPUT_LABEL: &str = "[outv]";

/// Fraction of the clip used as overlap when the requested overlap
/// does not fit inside the clip.
const FALLBACK_OVERLAP_RATIO: f64 = 0.1;

/// Shortest overlap, in frames, that leaves a fade of at least one frame.
const MIN_OVERLAP_FRAMES: f64 = 2.0;

/// A computed crossfade loop graph.
///
/// The numeric fields are the values baked into `description`; they are
/// kept alongside it for logging and progress estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopGraph {
    /// Overlap actually used, after the fallback substitution and the
    /// two-frame minimum.
    pub overlap_secs: f64,
    /// Source clip duration.
    pub total_secs: f64,
    /// Frame rate forced on both layers.
    pub frame_rate: f64,
    /// Length of the base layer and of the finished loop.
    pub base_duration_secs: f64,
    /// Where the overlay layer is cut from the source.
    pub tail_start_secs: f64,
    /// Duration of the overlay fade-out.
    pub fade_duration_secs: f64,
    description: String,
}

impl LoopGraph {
    /// The ffmpeg `-filter_complex` argument.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the requested overlap was replaced, either because it did not
    /// fit the clip or because it was shorter than two frames.
    pub fn overlap_was_clamped(&self, requested_secs: f64) -> bool {
        (self.overlap_secs - requested_secs).abs() > f64::EPSILON
    }
}

/// Builds the crossfade loop graph.
///
/// An overlap that is not shorter than the clip is replaced by 10% of the
/// clip. An overlap under two frames is raised to two frames when the clip
/// is long enough, so the fade never collapses to zero length. `total_secs <= 0` produces a degenerate graph; callers reject
/// such clips before getting here.
pub fn build_loop_graph(overlap_secs: f64, total_secs: f64, frame_rate: f64) -> LoopGraph {
    let overlap_secs = if overlap_secs >= total_secs {
        total_secs * FALLBACK_OVERLAP_RATIO
    } else {
        overlap_secs
    };

    let frame_duration = if frame_rate > 0.0 { 1.0 / frame_rate } else { 0.0 };
    let min_overlap_secs = MIN_OVERLAP_FRAMES * frame_duration;
    let overlap_secs = if overlap_secs < min_overlap_secs && min_overlap_secs < total_secs {
        min_overlap_secs
    } else {
        overlap_secs
    };
    let base_duration_secs = total_secs - overlap_secs;
    let tail_start_secs = total_secs - overlap_secs;
    // One frame short so the overlay is fully transparent before the
    // frame that would otherwise show the seam.
    let fade_duration_secs = (overlap_secs - frame_duration).max(0.0);

    let fps = fmt_secs(frame_rate);
    let description = format!(
        "[0:v]fps={fps},trim=start=0:end={base},setpts=PTS-STARTPTS[base];\
         [0:v]fps={fps},trim=start={tail}:end={total},setpts=PTS-STARTPTS,\
         format=yuva420p,fade=t=out:st=0:d={fade}:alpha=1[overlay];\
         [base][overlay]overlay=format=auto:eof_action=pass{label}",
        fps = fps,
        base = fmt_secs(base_duration_secs),
        tail = fmt_secs(tail_start_secs),
        total = fmt_secs(total_secs),
        fade = fmt_secs(fade_duration_secs),
        label = LOOP_OUTPUT_LABEL,
    );

    LoopGraph {
        overlap_secs,
        total_secs,
        frame_rate,
        base_duration_secs,
        tail_start_secs,
        fade_duration_secs,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_second_clip_two_second_overlap() {
        let graph = build_loop_graph(2.0, 20.0, 30.0);

        assert!((graph.base_duration_secs - 18.0).abs() < 1e-9);
        assert!((graph.tail_start_secs - 18.0).abs() < 1e-9);
        assert!((graph.fade_duration_secs - (2.0 - 1.0 / 30.0)).abs() < 1e-9);
        assert!((graph.fade_duration_secs - 1.967).abs() < 0.001);

        let desc = graph.description();
        assert!(desc.contains("fps=30,trim=start=0:end=18,"));
        assert!(desc.contains("trim=start=18:end=20,"));
        assert!(desc.contains("fade=t=out:st=0:d=1.966667:alpha=1"));
        assert!(desc.ends_with("[outv]"));
    }

    #[test]
    fn test_base_and_fade_durations_hold_across_inputs() {
        let cases = [
            (0.5, 3.0, 24.0),
            (1.0, 10.0, 29.97),
            (4.0, 60.0, 60.0),
            (0.2, 1.0, 25.0),
            (9.99, 10.0, 30.0),
        ];

        for (overlap, total, fps) in cases {
            let graph = build_loop_graph(overlap, total, fps);
            assert!(
                (graph.base_duration_secs - (total - overlap)).abs() < 1e-9,
                "base for {overlap}/{total}"
            );
            assert!(graph.fade_duration_secs < overlap);
            assert!((overlap - graph.fade_duration_secs - 1.0 / fps).abs() < 1e-9);
        }
    }

    #[test]
    fn test_overlap_longer_than_clip_uses_ten_percent() {
        let graph = build_loop_graph(30.0, 20.0, 30.0);
        assert!((graph.overlap_secs - 2.0).abs() < 1e-9);
        assert!((graph.base_duration_secs - 18.0).abs() < 1e-9);
        assert!(graph.overlap_was_clamped(30.0));
    }

    #[test]
    fn test_overlap_equal_to_clip_uses_ten_percent() {
        let graph = build_loop_graph(5.0, 5.0, 25.0);
        assert!((graph.overlap_secs - 0.5).abs() < 1e-9);
        assert!(!graph.overlap_was_clamped(0.5));
    }

    #[test]
    fn test_both_layers_get_the_same_frame_rate() {
        let graph = build_loop_graph(1.0, 8.0, 24.0);
        assert_eq!(graph.description().matches("fps=24,").count(), 2);
    }

    #[test]
    fn test_overlap_under_two_frames_is_raised_to_two() {
        for requested in [0.01, 1.0 / 30.0] {
            let graph = build_loop_graph(requested, 20.0, 30.0);
            assert!((graph.overlap_secs - 2.0 / 30.0).abs() < 1e-9);
            assert!((graph.fade_duration_secs - 1.0 / 30.0).abs() < 1e-9);
            assert!(graph.overlap_was_clamped(requested));

            let desc = graph.description();
            assert!(desc.contains("fade=t=out:st=0:d=0.033333:alpha=1"));
            assert!(!desc.contains("d=0:"));
        }
    }

    #[test]
    fn test_overlay_passes_base_through_after_the_tail_ends() {
        let graph = build_loop_graph(1.0, 10.0, 25.0);
        assert!(graph
            .description()
            .ends_with("[base][overlay]overlay=format=auto:eof_action=pass[outv]"));
    }

    #[test]
    fn test_degenerate_clip_does_not_panic() {
        let graph = build_loop_graph(1.0, 0.0, 0.0);
        assert_eq!(graph.overlap_secs, 0.0);
        assert!(graph.description().contains("[outv]"));
    }
}
