//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.answers.answer_set_limit == 0 {
            return Err(ConfigError::ValidationError(
                "answers.answer_set_limit must be > 0".into(),
            ));
        }
        if self.answers.max_answer_len == 0 {
            return Err(ConfigError::ValidationError(
                "answers.max_answer_len must be > 0".into(),
            ));
        }
        if self.relationships.min_occurrence == 0 {
            return Err(ConfigError::ValidationError(
                "relationships.min_occurrence must be > 0".into(),
            ));
        }
        if self.relationships.dir_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relationships.dir_name must not be empty".into(),
            ));
        }
        if self.logging.format != "pretty" && self.logging.format != "json" {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_answer_set_limit() {
        let mut config = Config::default();
        config.answers.answer_set_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("answer_set_limit"));
    }

    #[test]
    fn test_validate_rejects_zero_max_answer_len() {
        let mut config = Config::default();
        config.answers.max_answer_len = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_answer_len"));
    }

    #[test]
    fn test_validate_rejects_zero_min_occurrence() {
        let mut config = Config::default();
        config.relationships.min_occurrence = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_occurrence"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }
}
