//! # Schema composition
//!
//! Builds the single executable schema the gateway serves. A core GraphQL
//! definition is merged with the fragments contributed by registered services;
//! every fragment is merged on its own and is dropped (with a warning) when it
//! cannot be retrieved, parsed, or merged without conflicts. Only a broken core
//! definition is fatal.
//!
//! * [`registry`] - the SDL type registry and its merge rules
//! * [`resolver`] - resolver traits, bindings and resolver failures
//! * [`fragment`] - the service contract and the service registry
//! * [`composer`] - the composition entry points
//! * [`builder`] - compilation of the registry into an `async-graphql` dynamic schema

pub mod builder;
pub mod composer;
pub mod fragment;
pub mod registry;
pub mod resolver;

pub use composer::{compose, ComposedSchema, CoreDefinition, RejectedFragment, SchemaComposer};
pub use fragment::{GatewayService, ServiceFragment, ServiceRegistry};
pub use registry::{TypeCategory, TypeRegistry};
pub use resolver::{resolver_fn, Binding, Bindings, FieldCall, FieldResolver, ResolverError};

/// Fatal composition failures. Any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Error reading core schema: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core schema definition is invalid: {0}")]
    CoreDefinition(String),

    #[error("Core schema does not define the query root type '{0}'")]
    MissingQueryType(String),

    #[error("Core schema references undefined types: {}", .0.join(", "))]
    UnknownTypes(Vec<String>),

    #[error("Failed to build executable schema: {0}")]
    Build(String),
}

/// Reasons a single service fragment is left out of the composed schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("malformed definition: {0}")]
    Parse(String),

    #[error("type '{0}' is already defined")]
    DuplicateType(String),

    #[error("'{type_name}.{member}' is already defined")]
    DuplicateMember { type_name: String, member: String },

    #[error("extension targets unknown type '{0}'")]
    UnknownExtensionTarget(String),

    #[error("extension of '{0}' does not match the kind of the extended type")]
    ExtensionKindMismatch(String),

    #[error("{operation} root is already bound to '{existing}'")]
    RootConflict {
        operation: &'static str,
        existing: String,
    },

    #[error("references undefined types: {}", .0.join(", "))]
    UnknownTypes(Vec<String>),

    #[error("rejected by the engine: {0}")]
    Invalid(String),
}
