//! # Query Gateway Library
//!
//! A single-endpoint GraphQL gateway. At startup a core schema definition is
//! composed with the fragments contributed by independently registered
//! services; the result is served over HTTP, either one query per call or as a
//! batch whose results are streamed back in submission order.
//!
//! ## Core Components
//!
//! * `schema` - Composition of the core definition and service fragments
//! * `execution` - Query execution, the execution context and structured errors
//! * `gateway_node` - HTTP server, request dispatch, configuration and CORS
//! * `services` - Services bundled with the gateway
//! * `logging` - Logging setup with per-feature levels
//! * `error` - Process-level error types
//!
//! ## Failure handling
//!
//! A broken core definition stops the process. A broken service fragment is
//! only logged and left out. Malformed requests are rejected with a 400, and
//! failures during execution come back as structured errors next to whatever
//! data could still be resolved.

pub mod error;
pub mod execution;
pub mod gateway_node;
pub mod logging;
pub mod schema;
pub mod services;

pub use error::{GatewayError, GatewayResult};
pub use execution::{
    ExecutionContext, ExecutionEngine, ExecutionOptions, ExecutionResult, RequestEnvelope,
    StructuredError,
};
pub use gateway_node::{load_gateway_config, GatewayConfig, GatewayHttpServer};
pub use schema::{
    compose, resolver_fn, Bindings, ComposedSchema, CoreDefinition, FieldCall, FieldResolver,
    GatewayService, ResolverError, SchemaComposer, ServiceFragment, ServiceRegistry,
};
