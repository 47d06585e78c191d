//! Batch configuration.

use serde::{Deserialize, Serialize};

/// Configuration for batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Appended to each source's file stem to name its output.
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Replace an existing output file. When false, a free numbered name
    /// (`clip_LOOPER_2.mov`) is chosen instead.
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// File extensions picked up when a directory is given as a source.
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

fn default_output_suffix() -> String {
    "_LOOPER".to_string()
}

fn default_true() -> bool {
    true
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "mkv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_suffix: default_output_suffix(),
            overwrite: true,
            video_extensions: default_video_extensions(),
        }
    }
}

impl BatchConfig {
    /// Sets the output suffix.
    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Sets whether existing outputs are replaced.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.output_suffix, "_LOOPER");
        assert!(config.overwrite);
        assert_eq!(config.video_extensions, vec!["mp4", "mov", "avi", "mkv"]);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: BatchConfig = toml::from_str("overwrite = false").unwrap();
        assert!(!config.overwrite);
        assert_eq!(config.output_suffix, "_LOOPER");
    }
}
