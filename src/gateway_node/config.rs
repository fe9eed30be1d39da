use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default config file looked up when neither `--config` nor `GATEWAY_CONFIG`
/// is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

/// Configuration for a gateway instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP listening address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Development mode: enables the console, schema download and CORS
    #[serde(default)]
    pub devel_mode: bool,
    /// Core schema file; the bundled core schema is used when absent
    #[serde(default)]
    pub core_schema_path: Option<PathBuf>,
    /// Per-query deadline in milliseconds
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
    /// Value of `Access-Control-Allow-Headers` in development mode
    #[serde(default = "default_cors_allow_headers")]
    pub cors_allow_headers: Vec<String>,
    /// Include stack traces in error results (defaults to `devel_mode`)
    #[serde(default)]
    pub expose_error_detail: Option<bool>,
}

fn default_bind_address() -> String {
    "127.0.0.1:8978".to_string()
}

fn default_cors_allow_headers() -> Vec<String> {
    vec!["Set-Cookie".to_string(), "Content-Type".to_string()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            devel_mode: false,
            core_schema_path: None,
            query_timeout_ms: None,
            cors_allow_headers: default_cors_allow_headers(),
            expose_error_detail: None,
        }
    }
}

impl GatewayConfig {
    /// Set the listening address
    pub fn with_bind_address(mut self, address: &str) -> Self {
        self.bind_address = address.to_string();
        self
    }

    pub fn with_devel_mode(mut self, devel_mode: bool) -> Self {
        self.devel_mode = devel_mode;
        self
    }

    pub fn with_query_timeout(mut self, timeout_ms: u64) -> Self {
        self.query_timeout_ms = Some(timeout_ms);
        self
    }

    /// Replace the port of the bind address
    pub fn with_port(mut self, port: u16) -> Self {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| self.bind_address.clone());
        self.bind_address = format!("{}:{}", host, port);
        self
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    pub fn exposes_error_detail(&self) -> bool {
        self.expose_error_detail.unwrap_or(self.devel_mode)
    }

    /// Apply `GATEWAY_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(address) = std::env::var("GATEWAY_BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Ok(devel) = std::env::var("GATEWAY_DEVEL_MODE") {
            self.devel_mode = devel
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("GATEWAY_DEVEL_MODE={}", devel)))?;
        }
        if let Ok(path) = std::env::var("GATEWAY_CORE_SCHEMA") {
            self.core_schema_path = Some(PathBuf::from(path));
        }
        if let Ok(timeout) = std::env::var("GATEWAY_QUERY_TIMEOUT_MS") {
            self.query_timeout_ms = Some(timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("GATEWAY_QUERY_TIMEOUT_MS={}", timeout))
            })?);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address is empty".to_string()));
        }
        if self.query_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "query_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gateway configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse gateway configuration: {0}")]
    Parse(String),
    #[error("Invalid gateway configuration: {0}")]
    Invalid(String),
}

/// Load the gateway configuration.
///
/// The path is taken from `path`, then `GATEWAY_CONFIG`, then
/// [`DEFAULT_CONFIG_PATH`]. A missing file yields the defaults; environment
/// overrides and `port` are applied on top.
pub fn load_gateway_config(
    path: Option<&str>,
    port: Option<u16>,
) -> Result<GatewayConfig, ConfigError> {
    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var("GATEWAY_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = match std::fs::read_to_string(&config_path) {
        Ok(content) => toml::from_str::<GatewayConfig>(&content).map_err(|e| {
            log::error!("Failed to parse gateway configuration: {}", e);
            ConfigError::Parse(e.to_string())
        })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "No configuration at {}; using defaults",
                config_path
            );
            GatewayConfig::default()
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };

    config.apply_env_overrides()?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address, "127.0.0.1:8978");
        assert!(!config.exposes_error_detail());
        assert!(config.query_timeout().is_none());
    }

    #[test]
    fn devel_mode_exposes_detail_unless_overridden() {
        let mut config = GatewayConfig::default().with_devel_mode(true);
        assert!(config.exposes_error_detail());
        config.expose_error_detail = Some(false);
        assert!(!config.exposes_error_detail());
    }

    #[test]
    fn with_port_replaces_port() {
        let config = GatewayConfig::default().with_port(9100);
        assert_eq!(config.bind_address, "127.0.0.1:9100");
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = GatewayConfig::default().with_query_timeout(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
bind_address = "0.0.0.0:9000"
devel_mode = true
query_timeout_ms = 500
cors_allow_headers = ["Content-Type"]
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = load_gateway_config(Some(&path), Some(9001)).unwrap();
        assert!(config.devel_mode);
        assert_eq!(config.bind_address, "0.0.0.0:9001");
        assert_eq!(config.query_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.cors_allow_headers, vec!["Content-Type".to_string()]);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_gateway_config(path.to_str(), None).unwrap();
        assert_eq!(config.cors_allow_headers, GatewayConfig::default().cors_allow_headers);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = ").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert!(matches!(
            load_gateway_config(Some(&path), None),
            Err(ConfigError::Parse(_))
        ));
    }
}
