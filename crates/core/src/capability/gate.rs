//! The capability gate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::loop_filter::{CodecProfile, OutputCodec};
use crate::transcoder::TranscoderConfig;

use super::error::CapabilityError;
use super::types::{EncoderCapability, InstallReason, Readiness};

/// Parses `ffmpeg -encoders` output into the set of video encoder names.
///
/// Encoder rows look like ` V....D libx264    libx264 H.264 ...`; the legend
/// rows (` V..... = Video`) and audio/subtitle encoders are skipped.
pub fn parse_encoder_listing(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let flags = tokens.next()?;
            let name = tokens.next()?;
            let is_video = flags.len() == 6 && flags.starts_with(['V', 'v']);
            (is_video && name != "=").then(|| name.to_lowercase())
        })
        .collect()
}

/// Locates the transcoder and answers whether it can encode a codec.
///
/// Resolution and encoder probing are cached until `invalidate` is called.
/// All access goes through one async mutex, so concurrent checks never
/// probe twice or observe a half-invalidated cache.
pub struct CapabilityGate {
    config: TranscoderConfig,
    state: Mutex<Option<EncoderCapability>>,
}

impl CapabilityGate {
    /// Creates a gate with an empty cache.
    pub fn new(config: TranscoderConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    /// Creates a gate whose cache is already filled.
    pub fn with_capability(config: TranscoderConfig, capability: EncoderCapability) -> Self {
        Self {
            config,
            state: Mutex::new(Some(capability)),
        }
    }

    /// The configuration this gate searches with.
    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    /// Current cached state, without resolving anything.
    pub async fn snapshot(&self) -> Option<EncoderCapability> {
        self.state.lock().await.clone()
    }

    /// Drops the cached binary and encoder set.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if state.take().is_some() {
            debug!("Capability cache invalidated");
        }
    }

    /// Returns the transcoder binary, resolving it on first use.
    pub async fn resolve(&self) -> Result<PathBuf, CapabilityError> {
        let mut state = self.state.lock().await;
        let capability = self.resolve_locked(&mut state).await?;
        Ok(capability.path.clone())
    }

    /// Asks the binary at `path` whether it has an encoder for `codec`.
    ///
    /// Always runs the query; use `ensure_ready` for the cached check.
    pub async fn probe_codec(&self, path: &Path, codec: OutputCodec) -> Result<bool, CapabilityError> {
        let encoders = self.list_encoders(path).await?;
        Ok(EncoderCapability::new(path)
            .with_encoders(encoders)
            .supports(codec.profile())
            .unwrap_or(false))
    }

    /// Resolves the transcoder and checks it can encode `codec`.
    ///
    /// A transcoder without the requested codec is reported as needing an
    /// install; it is never substituted with a different codec.
    pub async fn ensure_ready(&self, codec: OutputCodec) -> Readiness {
        let profile: &CodecProfile = codec.profile();
        let mut state = self.state.lock().await;

        let capability = match self.resolve_locked(&mut state).await {
            Ok(capability) => capability,
            Err(CapabilityError::NotFound { .. }) => {
                return Readiness::NeedsInstall {
                    reason: InstallReason::TranscoderMissing,
                }
            }
            Err(e) => {
                return Readiness::Unusable {
                    reason: e.to_string(),
                }
            }
        };

        if capability.encoders.is_none() {
            match self.list_encoders(&capability.path).await {
                Ok(encoders) => {
                    debug!("Probed {} video encoders", encoders.len());
                    capability.encoders = Some(encoders);
                }
                Err(e) => {
                    return Readiness::Unusable {
                        reason: e.to_string(),
                    }
                }
            }
        }

        match capability.supports(profile) {
            Some(true) => Readiness::Ready {
                path: capability.path.clone(),
            },
            _ => {
                warn!(
                    "{} has no {} encoder",
                    capability.path.display(),
                    profile.family
                );
                Readiness::NeedsInstall {
                    reason: InstallReason::CodecMissing {
                        codec: profile.family.to_string(),
                    },
                }
            }
        }
    }

    /// Runs the configured install command, then invalidates the cache.
    pub async fn install(&self) -> Result<(), CapabilityError> {
        let command = self
            .config
            .install_command
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or(CapabilityError::InstallUnavailable)?;

        info!("Installing FFmpeg: {}", command.join(" "));
        let result = timeout(
            Duration::from_secs(self.config.install_timeout_secs),
            Command::new(&command[0])
                .args(&command[1..])
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await;

        // Whatever happened, the next check must look again.
        self.invalidate().await;

        match result {
            Err(_) => Err(CapabilityError::Timeout {
                what: "FFmpeg install".to_string(),
                timeout_secs: self.config.install_timeout_secs,
            }),
            Ok(Err(e)) => Err(CapabilityError::Io(e)),
            Ok(Ok(output)) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("Install stderr: {}", stderr.trim());
                Err(CapabilityError::install_failed(format!(
                    "installer exited with code: {:?}",
                    output.status.code()
                )))
            }
            Ok(Ok(_)) => {
                info!("FFmpeg install finished");
                Ok(())
            }
        }
    }

    async fn resolve_locked<'a>(
        &self,
        state: &'a mut Option<EncoderCapability>,
    ) -> Result<&'a mut EncoderCapability, CapabilityError> {
        let capability = match state.take() {
            Some(capability) => capability,
            None => self.locate().await?,
        };
        Ok(state.insert(capability))
    }

    /// Binaries worth trying, in search order, without duplicates.
    fn candidates(&self) -> Vec<PathBuf> {
        let binary = TranscoderConfig::binary_name();
        let mut found: Vec<PathBuf> = Vec::new();
        let mut push = |path: PathBuf| {
            if !found.contains(&path) {
                found.push(path);
            }
        };

        if let Some(explicit) = &self.config.ffmpeg_path {
            if explicit.components().count() == 1 {
                if let Ok(path) = which::which(explicit) {
                    push(path);
                }
            } else if explicit.is_file() {
                push(explicit.clone());
            }
        }

        if self.config.search_system_path {
            if let Ok(path) = which::which(&binary) {
                push(path);
            }
        }

        for dir in &self.config.search_dirs {
            let path = dir.join(&binary);
            if path.is_file() {
                push(path);
            }
        }

        found
    }

    fn searched_locations(&self) -> Vec<PathBuf> {
        let binary = TranscoderConfig::binary_name();
        self.config
            .ffmpeg_path
            .iter()
            .cloned()
            .chain(self.config.search_dirs.iter().map(|d| d.join(&binary)))
            .collect()
    }

    async fn locate(&self) -> Result<EncoderCapability, CapabilityError> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(CapabilityError::NotFound {
                searched: self.searched_locations(),
            });
        }

        for candidate in &candidates {
            match self.query(candidate, &["-version"]).await {
                Ok(output) if output.status.success() => {
                    let path = tokio::fs::canonicalize(candidate)
                        .await
                        .unwrap_or_else(|_| candidate.clone());
                    let version = String::from_utf8_lossy(&output.stdout)
                        .lines()
                        .next()
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty());

                    info!("Using FFmpeg at {}", path.display());
                    if let Some(ref v) = version {
                        info!("FFmpeg version: {}", v);
                    }
                    return Ok(EncoderCapability {
                        path,
                        version,
                        encoders: None,
                    });
                }
                Ok(output) => warn!(
                    "{} -version exited with code: {:?}",
                    candidate.display(),
                    output.status.code()
                ),
                Err(e) => warn!("{} -version failed: {}", candidate.display(), e),
            }
        }

        Err(CapabilityError::Unresponsive { candidates })
    }

    async fn list_encoders(&self, path: &Path) -> Result<BTreeSet<String>, CapabilityError> {
        let output = self.query(path, &["-hide_banner", "-encoders"]).await?;
        if !output.status.success() {
            return Err(CapabilityError::probe_failed(
                path,
                format!("exited with code: {:?}", output.status.code()),
            ));
        }
        Ok(parse_encoder_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn query(&self, program: &Path, args: &[&str]) -> Result<Output, CapabilityError> {
        let timeout_secs = self.config.query_timeout_secs;
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(Duration::from_secs(timeout_secs), output).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CapabilityError::Timeout {
                what: format!("{} {}", program.display(), args.join(" ")),
                timeout_secs,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "Encoders:
 V..... = Video
 A..... = Audio
 S..... = Subtitle
 .F.... = Frame-level multithreading
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D hap                  Vidvox Hap
 V..... prores_ks            Apple ProRes (iCodec Pro) (codec prores)
 A....D aac                  AAC (Advanced Audio Coding)
";

    #[test]
    fn test_parse_encoder_listing() {
        let encoders = parse_encoder_listing(LISTING);
        assert!(encoders.contains("libx264"));
        assert!(encoders.contains("hap"));
        assert!(encoders.contains("prores_ks"));
        assert!(!encoders.contains("aac"));
        assert!(!encoders.contains("="));
        assert_eq!(encoders.len(), 3);
    }

    #[test]
    fn test_parse_encoder_listing_empty() {
        assert!(parse_encoder_listing("").is_empty());
        assert!(parse_encoder_listing("ffmpeg version 6.1").is_empty());
    }

    #[tokio::test]
    async fn test_preloaded_gate_is_ready_without_processes() {
        let capability = EncoderCapability::new("/opt/ffmpeg/ffmpeg").with_encoders(["hap", "libx264"]);
        let gate = CapabilityGate::with_capability(
            TranscoderConfig::pinned(PathBuf::from("/nonexistent/ffmpeg")),
            capability,
        );

        let readiness = gate.ensure_ready(OutputCodec::Hap).await;
        assert_eq!(
            readiness,
            Readiness::Ready {
                path: PathBuf::from("/opt/ffmpeg/ffmpeg")
            }
        );
    }

    #[tokio::test]
    async fn test_missing_transcoder_needs_install() {
        let config = TranscoderConfig::pinned(PathBuf::from("/nonexistent/ffmpeg"));
        let gate = CapabilityGate::new(config);

        let readiness = gate.ensure_ready(OutputCodec::Mp4 { quality: 18 }).await;
        assert_eq!(
            readiness,
            Readiness::NeedsInstall {
                reason: InstallReason::TranscoderMissing
            }
        );
        assert!(matches!(
            gate.resolve().await,
            Err(CapabilityError::NotFound { .. })
        ));
        assert!(gate.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_clears_cache() {
        let gate = CapabilityGate::with_capability(
            TranscoderConfig::pinned(PathBuf::from("/nonexistent/ffmpeg")),
            EncoderCapability::new("/opt/ffmpeg/ffmpeg"),
        );
        assert!(gate.snapshot().await.is_some());
        gate.invalidate().await;
        assert!(gate.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_install_unavailable() {
        let gate = CapabilityGate::new(TranscoderConfig::pinned(PathBuf::from("/nonexistent/ffmpeg")));
        assert!(matches!(
            gate.install().await,
            Err(CapabilityError::InstallUnavailable)
        ));
    }
}
