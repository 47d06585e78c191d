//! Crossfade loop synthesis.
//!
//! Given how long a clip is and how much of its tail should blend into its
//! head, this module describes the ffmpeg filter graph that produces a
//! seamless loop:
//!
//! - **base**: the clip trimmed to `total - overlap`
//! - **overlay**: the last `overlap` seconds, moved to the start and faded
//!   from opaque to transparent one frame before the overlap ends
//!
//! It also holds the user-facing loop parameters and the codec table that
//! maps an output codec to encoder, container and quality flags.

mod graph;
mod params;

pub use graph::{build_loop_graph, LoopGraph, LOOP_OUTPUT_LABEL};
pub use params::{
    CodecProfile, LoopParameters, Overlap, OutputCodec, ParameterError, HAP_PROFILE, MAX_QUALITY,
    MP4_PROFILE,
};

/// Formats seconds for a filter-graph or argument string.
///
/// Six decimals are kept and trailing zeros dropped, so `18.0` renders
/// as `18` and `1.9666666` as `1.966667`.
pub(crate) fn fmt_secs(value: f64) -> String {
    let s = format!("{:.6}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_secs() {
        assert_eq!(fmt_secs(18.0), "18");
        assert_eq!(fmt_secs(1.9666666666), "1.966667");
        assert_eq!(fmt_secs(0.5), "0.5");
        assert_eq!(fmt_secs(0.0), "0");
        assert_eq!(fmt_secs(29.97002997), "29.97003");
    }
}
