//! Configuration for the transcoder and its discovery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for locating and running ffmpeg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Explicit ffmpeg binary, tried before any search.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Whether to look for ffmpeg on the runtime `PATH`.
    #[serde(default = "default_true")]
    pub search_system_path: bool,

    /// Well-known install directories, searched in order after `PATH`.
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<PathBuf>,

    /// FFmpeg log level. Progress stats need `info` or more verbose.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional global ffmpeg arguments, placed before the inputs.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Command that installs or upgrades ffmpeg, if the platform has one.
    #[serde(default = "default_install_command")]
    pub install_command: Option<Vec<String>>,

    /// Timeout for the `-version` and `-encoders` queries in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Timeout for the install command in seconds.
    #[serde(default = "default_install_timeout")]
    pub install_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_search_dirs() -> Vec<PathBuf> {
    let dirs: &[&str] = if cfg!(windows) {
        &[
            r"C:\ffmpeg\bin",
            r"C:\Program Files\ffmpeg\bin",
            r"C:\Program Files (x86)\ffmpeg\bin",
        ]
    } else {
        &[
            "/usr/local/bin",
            "/opt/homebrew/bin",
            "/usr/bin",
            "/opt/local/bin",
            "/snap/bin",
        ]
    };
    dirs.iter().map(PathBuf::from).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_install_command() -> Option<Vec<String>> {
    let cmd: &[&str] = if cfg!(windows) {
        &[
            "winget",
            "install",
            "Gyan.FFmpeg.Full",
            "--accept-package-agreements",
            "--accept-source-agreements",
            "--silent",
        ]
    } else if cfg!(target_os = "macos") {
        &["brew", "install", "ffmpeg"]
    } else {
        return None;
    };
    Some(cmd.iter().map(|s| s.to_string()).collect())
}

fn default_query_timeout() -> u64 {
    10
}

fn default_install_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: default_ffprobe_path(),
            search_system_path: true,
            search_dirs: default_search_dirs(),
            log_level: default_log_level(),
            extra_args: Vec::new(),
            install_command: default_install_command(),
            query_timeout_secs: default_query_timeout(),
            install_timeout_secs: default_install_timeout(),
        }
    }
}

impl TranscoderConfig {
    /// File name of the ffmpeg executable on this platform.
    pub fn binary_name() -> String {
        format!("ffmpeg{}", std::env::consts::EXE_SUFFIX)
    }

    /// Creates a config pinned to one ffmpeg binary, with no searching.
    pub fn pinned(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path: Some(ffmpeg_path),
            search_system_path: false,
            search_dirs: Vec::new(),
            install_command: None,
            ..Default::default()
        }
    }

    /// Sets the ffprobe path.
    pub fn with_ffprobe(mut self, ffprobe_path: PathBuf) -> Self {
        self.ffprobe_path = ffprobe_path;
        self
    }

    /// Replaces the well-known search directories.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Sets the install command.
    pub fn with_install_command(mut self, command: Option<Vec<String>>) -> Self {
        self.install_command = command;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranscoderConfig::default();
        assert_eq!(config.ffmpeg_path, None);
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert!(config.search_system_path);
        assert!(!config.search_dirs.is_empty());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.query_timeout_secs, 10);
        assert_eq!(config.install_timeout_secs, 300);
    }

    #[test]
    fn test_pinned_config() {
        let config = TranscoderConfig::pinned(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
            .with_ffprobe(PathBuf::from("/opt/ffmpeg/bin/ffprobe"));

        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
        assert_eq!(config.ffprobe_path, PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
        assert!(!config.search_system_path);
        assert!(config.search_dirs.is_empty());
        assert!(config.install_command.is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: TranscoderConfig = toml::from_str("log_level = \"warning\"").unwrap();
        assert_eq!(config.log_level, "warning");
        assert!(config.search_system_path);
        assert_eq!(config.search_dirs, default_search_dirs());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            ffmpeg_path = "/srv/tools/ffmpeg"
            ffprobe_path = "/srv/tools/ffprobe"
            search_system_path = false
            search_dirs = ["/srv/tools"]
            extra_args = ["-threads", "4"]
            install_command = ["apt-get", "install", "-y", "ffmpeg"]
            query_timeout_secs = 5
        "#;
        let config: TranscoderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/srv/tools/ffmpeg")));
        assert!(!config.search_system_path);
        assert_eq!(config.search_dirs, vec![PathBuf::from("/srv/tools")]);
        assert_eq!(config.extra_args, vec!["-threads", "4"]);
        assert_eq!(config.install_command.as_ref().map(|c| c.len()), Some(4));
        assert_eq!(config.query_timeout_secs, 5);
    }
}
