//! # Logging System
//!
//! Sets up the `log` facade for the gateway. Output goes through `env_logger`;
//! the global level and the per-feature levels come from [`LogConfig`].

pub mod config;
pub mod features;

use config::{LogConfig, LogConfigError};
use once_cell::sync::OnceCell;
use std::io::Write;

/// Global logging configuration instance
static LOGGING_CONFIG: OnceCell<LogConfig> = OnceCell::new();

pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize the logging system with configuration taken from the environment
    pub fn init_default() -> Result<(), LoggingError> {
        let config = LogConfig::from_env()?;
        Self::init_with_config(config)
    }

    /// Initialize the logging system with a custom configuration
    pub fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        config.validate()?;

        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.level_filter());
        for (target, level) in config.feature_filters() {
            builder.filter_module(target, level);
        }
        builder.write_style(if config.general.enable_colors {
            env_logger::WriteStyle::Auto
        } else {
            env_logger::WriteStyle::Never
        });

        let include_timestamp = config.general.include_timestamp;
        let include_module = config.general.include_module;
        builder.format(move |buf, record| {
            if include_timestamp {
                write!(buf, "{} ", buf.timestamp_millis())?;
            }
            write!(buf, "{:<5} ", record.level())?;
            if include_module {
                write!(buf, "[{}] ", record.target())?;
            }
            writeln!(buf, "{}", record.args())
        });

        LOGGING_CONFIG
            .set(config)
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        builder
            .try_init()
            .map_err(|e| LoggingError::Backend(e.to_string()))
    }

    /// Get the global logging configuration
    pub fn get_config() -> Option<&'static LogConfig> {
        LOGGING_CONFIG.get()
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Config error: {0}")]
    Config(#[from] LogConfigError),
    #[error("Failed to install logger: {0}")]
    Backend(String),
}
