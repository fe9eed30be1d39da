//! Core schema bundled with the gateway and its bindings.

use crate::gateway_node::GatewayConfig;
use crate::log_schema_warn;
use crate::schema::{resolver_fn, Bindings, ComposedSchema, CoreDefinition, SchemaError};
use once_cell::sync::OnceCell;
use serde_json::{json, Value};
use std::sync::Arc;

/// Core schema used when no `core_schema_path` is configured.
pub const CORE_SCHEMA: &str = include_str!("schema/core.graphqls");

/// Data behind `Query.serverConfig`.
#[derive(Debug)]
pub struct ServerInfo {
    name: String,
    version: String,
    devel_mode: bool,
    services: OnceCell<Vec<String>>,
}

impl ServerInfo {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            devel_mode: config.devel_mode,
            services: OnceCell::new(),
        }
    }

    /// Remember which services made it into `schema`. Only the first call has
    /// an effect.
    pub fn record_services(&self, schema: &ComposedSchema) {
        if self
            .services
            .set(schema.accepted_services().to_vec())
            .is_err()
        {
            log_schema_warn!("Accepted services were already recorded; keeping the first list");
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.version,
            "develMode": self.devel_mode,
            "services": self.services.get().cloned().unwrap_or_default(),
        })
    }
}

pub fn core_bindings(info: Arc<ServerInfo>) -> Bindings {
    Bindings::new().with(
        "Query",
        "serverConfig",
        resolver_fn(move |_| Ok(info.to_json())),
    )
}

/// The configured core schema (or the bundled one) with its bindings.
pub fn core_definition(
    config: &GatewayConfig,
    info: Arc<ServerInfo>,
) -> Result<CoreDefinition, SchemaError> {
    let core = match &config.core_schema_path {
        Some(path) => CoreDefinition::from_file(path)?,
        None => CoreDefinition::new(CORE_SCHEMA),
    };
    Ok(core.with_bindings(core_bindings(info)))
}
