//! Configuration management for the logging system
//!
//! This module handles loading logging configuration from TOML files and
//! environment variables.

use super::features::LogFeature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const VALID_LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// Main logging configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// General logging settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Feature-specific log levels, keyed by feature name (`schema`, `query`, ...)
    #[serde(default = "LogConfig::default_features")]
    pub features: HashMap<String, String>,
}

/// General logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default log level for all modules
    pub default_level: String,
    /// Enable colored output
    pub enable_colors: bool,
    /// Include timestamps
    pub include_timestamp: bool,
    /// Include module path
    pub include_module: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            features: Self::default_features(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_level: "INFO".to_string(),
            enable_colors: true,
            include_timestamp: true,
            include_module: true,
        }
    }
}

impl LogConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LogConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(LogConfigError::Io)?;

        let mut config: LogConfig =
            toml::from_str(&content).map_err(|e| LogConfigError::Parse(e.to_string()))?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, LogConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("GATEWAY_LOG_LEVEL") {
            self.general.default_level = level.to_uppercase();
        }
        if let Ok(colors) = std::env::var("GATEWAY_LOG_COLORS") {
            self.general.enable_colors = colors.parse().unwrap_or(true);
        }

        for (key, value) in std::env::vars() {
            if let Some(feature) = key.strip_prefix("GATEWAY_LOG_FEATURE_") {
                self.features
                    .insert(feature.to_lowercase(), value.to_uppercase());
            }
        }
    }

    fn default_features() -> HashMap<String, String> {
        let mut features = HashMap::new();
        features.insert("schema".to_string(), "INFO".to_string());
        features.insert("query".to_string(), "INFO".to_string());
        features.insert("http_server".to_string(), "INFO".to_string());
        features.insert("cors".to_string(), "WARN".to_string());
        features
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LogConfigError> {
        if !VALID_LEVELS.contains(&self.general.default_level.as_str()) {
            return Err(LogConfigError::InvalidLevel(
                self.general.default_level.clone(),
            ));
        }

        for (feature, level) in &self.features {
            if LogFeature::from_name(feature).is_none() {
                return Err(LogConfigError::UnknownFeature(feature.clone()));
            }
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(LogConfigError::InvalidFeatureLevel(
                    feature.clone(),
                    level.clone(),
                ));
            }
        }

        Ok(())
    }

    /// Global level filter derived from `general.default_level`
    pub fn level_filter(&self) -> log::LevelFilter {
        parse_level(&self.general.default_level).unwrap_or(log::LevelFilter::Info)
    }

    /// `(log target, level)` pairs for every configured feature
    pub fn feature_filters(&self) -> Vec<(&'static str, log::LevelFilter)> {
        let mut filters: Vec<_> = self
            .features
            .iter()
            .filter_map(|(name, level)| {
                let feature = LogFeature::from_name(name)?;
                Some((feature.target(), parse_level(level)?))
            })
            .collect();
        filters.sort_by_key(|(target, _)| *target);
        filters
    }
}

pub(crate) fn parse_level(level: &str) -> Option<log::LevelFilter> {
    match level {
        "TRACE" => Some(log::LevelFilter::Trace),
        "DEBUG" => Some(log::LevelFilter::Debug),
        "INFO" => Some(log::LevelFilter::Info),
        "WARN" => Some(log::LevelFilter::Warn),
        "ERROR" => Some(log::LevelFilter::Error),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum LogConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
    #[error("Unknown logging feature: {0}")]
    UnknownFeature(String),
    #[error("Invalid log level for feature '{0}': {1}")]
    InvalidFeatureLevel(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = LogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn rejects_unknown_level() {
        let mut config = LogConfig::default();
        config.general.default_level = "LOUD".to_string();
        assert!(matches!(
            config.validate(),
            Err(LogConfigError::InvalidLevel(_))
        ));
    }

    #[test]
    fn rejects_unknown_feature() {
        let mut config = LogConfig::default();
        config
            .features
            .insert("transform".to_string(), "DEBUG".to_string());
        assert!(matches!(
            config.validate(),
            Err(LogConfigError::UnknownFeature(_))
        ));
    }

    #[test]
    fn loads_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[general]
default_level = "DEBUG"
enable_colors = false
include_timestamp = true
include_module = false

[features]
schema = "WARN"
"#
        )
        .unwrap();

        let config = LogConfig::from_file(file.path()).unwrap();
        assert!(!config.general.enable_colors);
        assert_eq!(
            config.feature_filters(),
            vec![("query_gateway::schema", log::LevelFilter::Warn)]
        );
    }
}
