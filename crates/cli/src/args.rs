use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use looper_core::config::{CodecChoice, LoopDefaults, OverlapUnit};
use looper_core::{LoopParameters, OutputCodec};

#[derive(Parser, Debug)]
#[command(name = "looper")]
#[command(about = "Turn video clips into seamless loops by crossfading their tail into their head")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML). Defaults plus LOOPER_* environment
    /// variables are used when omitted.
    #[arg(short, long, global = true, env = "LOOPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Loop a batch of clips into an output directory
    Run {
        /// Source files, or directories of videos
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        #[command(flatten)]
        loop_args: LoopArgs,

        /// Install FFmpeg and retry once if it is missing or lacks the codec
        #[arg(long)]
        install: bool,

        /// Print batch events as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check that FFmpeg is present and has the encoder for a codec
    Check {
        #[arg(long, value_enum)]
        codec: Option<CodecArg>,
    },

    /// Install or upgrade FFmpeg with the configured installer
    Install,

    /// Print what the prober reads from a video, as JSON
    Probe {
        file: PathBuf,
    },

    /// Print the crossfade filter graph for a clip
    Graph {
        /// Clip duration in seconds
        #[arg(long)]
        duration: f64,

        /// Clip frame rate
        #[arg(long)]
        fps: f64,

        #[command(flatten)]
        loop_args: LoopArgs,
    },
}

/// Loop settings that override the configured defaults.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LoopArgs {
    /// Crossfade length
    #[arg(long)]
    pub overlap: Option<f64>,

    /// Unit of --overlap
    #[arg(long, value_enum)]
    pub unit: Option<UnitArg>,

    /// Output codec
    #[arg(long, value_enum)]
    pub codec: Option<CodecArg>,

    /// MP4 quality (CRF 0-51, lower is better)
    #[arg(long)]
    pub quality: Option<u8>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitArg {
    Seconds,
    Frames,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecArg {
    Hap,
    Mp4,
}

impl From<CodecArg> for CodecChoice {
    fn from(codec: CodecArg) -> Self {
        match codec {
            CodecArg::Hap => CodecChoice::Hap,
            CodecArg::Mp4 => CodecChoice::Mp4,
        }
    }
}

impl From<UnitArg> for OverlapUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Seconds => OverlapUnit::Seconds,
            UnitArg::Frames => OverlapUnit::Frames,
        }
    }
}

impl LoopArgs {
    /// Applies these overrides on top of the configured defaults.
    pub fn resolve(&self, defaults: &LoopDefaults) -> LoopParameters {
        let mut merged = defaults.clone();
        if let Some(overlap) = self.overlap {
            merged.overlap = overlap;
        }
        if let Some(unit) = self.unit {
            merged.overlap_unit = unit.into();
        }
        if let Some(codec) = self.codec {
            merged.codec = codec.into();
        }
        if let Some(quality) = self.quality {
            merged.quality = quality;
        }
        merged.to_parameters()
    }
}

/// Codec to check when none is given on the command line.
pub fn codec_or_default(codec: Option<CodecArg>, defaults: &LoopDefaults) -> OutputCodec {
    let mut merged = defaults.clone();
    if let Some(codec) = codec {
        merged.codec = codec.into();
    }
    merged.codec()
}
