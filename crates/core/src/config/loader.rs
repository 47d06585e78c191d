use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment prefix; nested keys are separated by `__`,
/// e.g. `LOOPER_TRANSCODER__FFMPEG_PATH`.
const ENV_PREFIX: &str = "LOOPER_";

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load the named file, or built-in defaults plus environment overrides
/// when no file is named
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Figment::from(Serialized::defaults(Config::default()))
            .merge(env_provider())
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodecChoice, OverlapUnit};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[transcoder]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
search_system_path = false

[defaults]
overlap = 24
overlap_unit = "frames"
codec = "mp4"
quality = 20
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(
            config.transcoder.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert!(!config.transcoder.search_system_path);
        assert_eq!(config.defaults.overlap_unit, OverlapUnit::Frames);
        assert_eq!(config.defaults.codec, CodecChoice::Mp4);
        assert_eq!(config.defaults.quality, 20);
        assert_eq!(config.batch.output_suffix, "_LOOPER");
    }

    #[test]
    fn test_load_config_from_str_empty() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, crate::config::Config::default());
    }

    #[test]
    fn test_load_config_from_str_bad_codec() {
        let result = load_config_from_str("[defaults]\ncodec = \"prores\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));

        let result = load_config_or_default(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[batch]
output_suffix = "_loop"
overwrite = false
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.batch.output_suffix, "_loop");
        assert!(!config.batch.overwrite);
        assert_eq!(config.defaults.quality, 18);
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "looper.toml",
                r#"
[defaults]
quality = 20
"#,
            )?;
            jail.set_env("LOOPER_DEFAULTS__QUALITY", "28");
            jail.set_env("LOOPER_BATCH__OUTPUT_SUFFIX", "_env");

            let config = load_config(Path::new("looper.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.defaults.quality, 28);
            assert_eq!(config.batch.output_suffix, "_env");
            Ok(())
        });
    }

    #[test]
    fn test_defaults_with_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LOOPER_DEFAULTS__CODEC", "mp4");

            let config = load_config_or_default(None).map_err(|e| e.to_string())?;
            assert_eq!(config.defaults.codec, CodecChoice::Mp4);
            assert_eq!(config.defaults.overlap, 1.0);
            Ok(())
        });
    }
}
