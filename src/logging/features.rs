//! Feature-specific logging macros
//!
//! Each gateway component logs under its own target so levels can be tuned per
//! feature through [`LogConfig`](super::config::LogConfig).

/// Feature categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFeature {
    Schema,
    Query,
    HttpServer,
    Cors,
}

impl LogFeature {
    /// Get the target string for this feature
    pub fn target(&self) -> &'static str {
        match self {
            LogFeature::Schema => "query_gateway::schema",
            LogFeature::Query => "query_gateway::query",
            LogFeature::HttpServer => "query_gateway::http_server",
            LogFeature::Cors => "query_gateway::cors",
        }
    }

    /// Resolve a feature from its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "schema" => Some(LogFeature::Schema),
            "query" => Some(LogFeature::Query),
            "http_server" => Some(LogFeature::HttpServer),
            "cors" => Some(LogFeature::Cors),
            _ => None,
        }
    }
}

// Schema composition logging macros
#[macro_export]
macro_rules! log_schema_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "query_gateway::schema", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_schema_info {
    ($($arg:tt)*) => {
        log::info!(target: "query_gateway::schema", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_schema_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "query_gateway::schema", $($arg)*)
    };
}

// Query execution logging macros
#[macro_export]
macro_rules! log_query_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "query_gateway::query", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_query_warn {
    ($($arg:tt)*) => {
        log::warn!(target: "query_gateway::query", $($arg)*)
    };
}

// HTTP Server-specific logging macros
#[macro_export]
macro_rules! log_http_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "query_gateway::http_server", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_http_info {
    ($($arg:tt)*) => {
        log::info!(target: "query_gateway::http_server", $($arg)*)
    };
}

#[macro_export]
macro_rules! log_http_error {
    ($($arg:tt)*) => {
        log::error!(target: "query_gateway::http_server", $($arg)*)
    };
}

// CORS negotiation logging macros
#[macro_export]
macro_rules! log_cors_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "query_gateway::cors", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::LogFeature;

    #[test]
    fn names_round_trip_to_targets() {
        for name in ["schema", "query", "http_server", "cors"] {
            let feature = LogFeature::from_name(name).unwrap();
            assert!(feature.target().ends_with(name));
        }
        assert!(LogFeature::from_name("network").is_none());
    }
}
