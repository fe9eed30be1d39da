//! # Gateway node
//!
//! The HTTP side of the gateway: configuration, the request dispatcher, the
//! development routes and CORS negotiation.

pub mod config;
pub mod cors;
pub mod dev_routes;
pub mod http_server;
pub mod query_routes;

pub use config::{load_gateway_config, ConfigError, GatewayConfig};
pub use cors::{CorsHeaders, DevCorsNegotiator};
pub use http_server::{configure_routes, AppState, GatewayHttpServer};
