//! Transcoder discovery and codec capability checks.
//!
//! The `CapabilityGate` owns the one cached view of which ffmpeg binary is
//! in use and which encoders it has. The batch orchestrator asks it for
//! readiness before touching any file; after an install attempt the cache
//! is invalidated so the next check re-resolves and re-probes.

mod error;
mod gate;
mod types;

pub use error::CapabilityError;
pub use gate::{parse_encoder_listing, CapabilityGate};
pub use types::{EncoderCapability, InstallReason, Readiness};
