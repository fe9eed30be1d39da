//! Services bundled with the gateway.

pub mod core_schema;
pub mod system;

pub use core_schema::{core_definition, ServerInfo, CORE_SCHEMA};
pub use system::SystemService;

use crate::schema::ServiceRegistry;

/// Registry holding every bundled service.
pub fn builtin_registry() -> ServiceRegistry {
    ServiceRegistry::new().with(SystemService)
}
