//! Types for the capability module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::loop_filter::CodecProfile;

/// Cached facts about the resolved transcoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCapability {
    /// Absolute path of the binary that answered `-version`.
    pub path: PathBuf,
    /// First line of its version banner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Video encoder names, once probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoders: Option<BTreeSet<String>>,
}

impl EncoderCapability {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            version: None,
            encoders: None,
        }
    }

    /// Sets the probed encoder set.
    pub fn with_encoders<I, S>(mut self, encoders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encoders = Some(encoders.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the probed encoders include the profile's family.
    ///
    /// The base name or any listed variant counts. `None` until probed.
    pub fn supports(&self, profile: &CodecProfile) -> Option<bool> {
        let encoders = self.encoders.as_ref()?;
        Some(
            encoders.contains(profile.probe_name)
                || profile.probe_variants.iter().any(|v| encoders.contains(*v)),
        )
    }
}

/// Why the caller should offer an install or upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstallReason {
    /// No transcoder binary could be located.
    TranscoderMissing,
    /// The transcoder runs but lacks the requested codec.
    CodecMissing { codec: String },
}

/// Outcome of a readiness check for one codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Readiness {
    /// The transcoder at `path` can encode the codec.
    Ready { path: PathBuf },
    /// Installing or upgrading the transcoder would fix this.
    NeedsInstall { reason: InstallReason },
    /// A transcoder exists but cannot be used.
    Unusable { reason: String },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Resolved binary, when ready.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Ready { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { path } => write!(f, "ready ({})", path.display()),
            Self::NeedsInstall {
                reason: InstallReason::TranscoderMissing,
            } => f.write_str("FFmpeg is not installed; install it to continue"),
            Self::NeedsInstall {
                reason: InstallReason::CodecMissing { codec },
            } => write!(
                f,
                "FFmpeg lacks the {} encoder; install a full build to continue",
                codec
            ),
            Self::Unusable { reason } => write!(f, "FFmpeg is unusable: {}", reason),
        }
    }
}
