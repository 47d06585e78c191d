//! The transcode fallback ladder.
//!
//! Every job is tried against a fixed sequence of strategies, from the
//! crossfaded composite loop down to a plain re-encode, stopping at the
//! first rung whose transcoder run exits cleanly. Rung failures never
//! escape the chain; they are collected into the job outcome.

mod error;
mod ladder;
mod strategy;
mod types;

pub use error::RungError;
pub use ladder::TranscodeFallbackChain;
pub use strategy::{Strategy, PASSTHROUGH_QUALITY};
pub use types::{ChainProgress, JobOutcome, StrategyFailure, TranscodeJob};
