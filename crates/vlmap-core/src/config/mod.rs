//! Configuration management for vlmap.
//!
//! Configuration is loaded from the platform config directory, falling back to
//! the standard dataset layout. CLI flags override individual values; the
//! merged result is validated before a job starts.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for vlmap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Vocabulary store locations
    pub vocabulary: VocabularyConfig,

    /// Caption corpus locations
    pub captions: CaptionsConfig,

    /// Answer-set construction
    pub answers: AnswersConfig,

    /// Relationship dataset construction
    pub relationships: RelationshipsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.vlmap.vlmap/config.toml
    /// - Linux: ~/.config/vlmap/config.toml
    ///
    /// Falls back to ~/.vlmap/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "vlmap", "vlmap")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".vlmap").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Check the whole configuration, e.g. after CLI overrides were applied.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()
    }
}

/// Expand a leading `~` in a configured path.
pub fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
