use crate::gateway_node::config::ConfigError;
use crate::logging::LoggingError;
use crate::schema::SchemaError;
use std::io;

/// Unified error type for the gateway process.
///
/// Only startup and serving failures end up here. Per-request problems are
/// answered on the wire (400s or structured errors) and never surface as a
/// `GatewayError`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The composed schema could not be built (core definition unusable)
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while setting up logging
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Errors related to IO operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The HTTP server failed to bind or stopped with an error
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for operations that can result in a GatewayError
pub type GatewayResult<T> = Result<T, GatewayError>;
