use super::{types::Config, ConfigError};
use crate::loop_filter::MAX_QUALITY;

/// Validate configuration
/// Currently validates:
/// - Default overlap is a positive number
/// - Default quality is within the CRF range
/// - Output suffix is not empty
/// - Timeouts are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let defaults = &config.defaults;
    if defaults.overlap <= 0.0 || !defaults.overlap.is_finite() {
        return Err(ConfigError::ValidationError(format!(
            "defaults.overlap must be greater than 0, got {}",
            defaults.overlap
        )));
    }
    if defaults.quality > MAX_QUALITY {
        return Err(ConfigError::ValidationError(format!(
            "defaults.quality must be between 0 and {}, got {}",
            MAX_QUALITY, defaults.quality
        )));
    }

    if config.batch.output_suffix.is_empty() {
        return Err(ConfigError::ValidationError(
            "batch.output_suffix cannot be empty".to_string(),
        ));
    }

    if config.transcoder.query_timeout_secs == 0 || config.transcoder.install_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transcoder timeouts cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoopDefaults, OverlapUnit};

    #[test]
    fn test_validate_valid_config() {
        tokio_test::assert_ok!(validate_config(&Config::default()));
    }

    #[test]
    fn test_validate_quality_out_of_range() {
        let mut config = Config::default();
        config.defaults.quality = 52;
        let err = tokio_test::assert_err!(validate_config(&config));
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("defaults.quality"));
    }

    #[test]
    fn test_validate_overlap() {
        let mut config = Config::default();
        config.defaults = LoopDefaults {
            overlap: 0.0,
            overlap_unit: OverlapUnit::Frames,
            ..LoopDefaults::default()
        };
        assert!(validate_config(&config).is_err());

        config.defaults.overlap = f64::INFINITY;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_suffix() {
        let mut config = Config::default();
        config.batch.output_suffix.clear();
        assert!(validate_config(&config).is_err());
    }
}
