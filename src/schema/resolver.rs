//! Field resolvers and how they are bound to schema fields.
//!
//! Services hand the composer a [`Bindings`] set of `(type, field)` pairs. The
//! composer folds every accepted set into a single [`Wiring`] table that the
//! schema builder consults while compiling the executable schema.

use super::registry::TypeRegistry;
use crate::execution::context::ExecutionContext;
use crate::log_schema_warn;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Failure reported by a field resolver.
///
/// `Domain` failures are expected, business-level outcomes and reach the
/// client with their code. Everything else is `Generic`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolverError {
    #[error("{message}")]
    Domain { code: String, message: String },

    #[error("{message}")]
    Generic {
        message: String,
        trace: Option<String>,
    },
}

impl ResolverError {
    pub fn domain(code: impl Into<String>, message: impl Into<String>) -> Self {
        ResolverError::Domain {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        ResolverError::Generic {
            message: message.into(),
            trace: None,
        }
    }

    /// Wrap an arbitrary error, keeping its source chain (and a backtrace when
    /// `RUST_BACKTRACE` enables one) as the trace.
    pub fn unexpected<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut trace = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push_str(&format!("Caused by: {}\n", cause));
            source = cause.source();
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            trace.push_str(&backtrace.to_string());
        }

        ResolverError::Generic {
            message: error.to_string(),
            trace: (!trace.is_empty()).then_some(trace),
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "resolver panicked".to_string()
        };
        ResolverError::Generic {
            message,
            trace: Some("resolver panicked".to_string()),
        }
    }

    /// Domain code, if this is a domain failure.
    pub fn code(&self) -> Option<&str> {
        match self {
            ResolverError::Domain { code, .. } => Some(code),
            ResolverError::Generic { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ResolverError::Domain { message, .. } | ResolverError::Generic { message, .. } => {
                message
            }
        }
    }

    pub fn trace(&self) -> Option<&str> {
        match self {
            ResolverError::Generic { trace, .. } => trace.as_deref(),
            ResolverError::Domain { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(error: serde_json::Error) -> Self {
        ResolverError::unexpected(&error)
    }
}

/// Everything a resolver gets to see for one field invocation.
pub struct FieldCall<'a> {
    pub type_name: &'a str,
    pub field_name: &'a str,
    /// Resolved value of the parent object (`null` for root fields).
    pub parent: &'a Value,
    pub arguments: Map<String, Value>,
    pub context: &'a ExecutionContext,
}

impl<'a> FieldCall<'a> {
    /// Deserialize an optional argument. Absent and `null` both yield `None`.
    pub fn argument<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ResolverError> {
        match self.arguments.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ResolverError::generic(format!("Invalid argument '{}': {}", name, e))),
        }
    }

    pub fn required_argument<T: DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        self.argument(name)?
            .ok_or_else(|| ResolverError::generic(format!("Missing argument '{}'", name)))
    }
}

/// Resolves one schema field.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(&self, call: FieldCall<'_>) -> Result<Value, ResolverError>;
}

/// Resolver backed by a synchronous closure; see [`resolver_fn`].
pub struct FnResolver<F> {
    function: F,
}

#[async_trait]
impl<F> FieldResolver for FnResolver<F>
where
    F: Fn(&FieldCall<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
{
    async fn resolve(&self, call: FieldCall<'_>) -> Result<Value, ResolverError> {
        (self.function)(&call)
    }
}

/// Turn a plain closure into a [`FieldResolver`].
pub fn resolver_fn<F>(function: F) -> FnResolver<F>
where
    F: Fn(&FieldCall<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
{
    FnResolver { function }
}

#[derive(Clone)]
pub struct Binding {
    pub type_name: String,
    pub field_name: String,
    pub resolver: Arc<dyn FieldResolver>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding({}.{})", self.type_name, self.field_name)
    }
}

/// Ordered set of field bindings contributed by one service.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<R>(&mut self, type_name: &str, field_name: &str, resolver: R) -> &mut Self
    where
        R: FieldResolver + 'static,
    {
        self.entries.push(Binding {
            type_name: type_name.to_string(),
            field_name: field_name.to_string(),
            resolver: Arc::new(resolver),
        });
        self
    }

    /// Builder-style variant of [`Bindings::bind`].
    pub fn with<R>(mut self, type_name: &str, field_name: &str, resolver: R) -> Self
    where
        R: FieldResolver + 'static,
    {
        self.bind(type_name, field_name, resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }
}

#[derive(Clone)]
pub(crate) struct WiredResolver {
    pub owner: String,
    pub resolver: Arc<dyn FieldResolver>,
}

/// Consolidated `(type, field) -> resolver` table of a composed schema.
#[derive(Clone, Default)]
pub struct Wiring {
    resolvers: HashMap<(String, String), WiredResolver>,
}

impl Wiring {
    /// Add `bindings` contributed by `owner`.
    ///
    /// The first binding of a field wins; bindings for fields the registry does
    /// not define are dropped.
    pub fn absorb(&mut self, owner: &str, bindings: &Bindings, registry: &TypeRegistry) {
        for binding in bindings.iter() {
            if !registry.has_field(&binding.type_name, &binding.field_name) {
                log_schema_warn!(
                    "Service '{}' binds unknown field {}.{}; binding dropped",
                    owner,
                    binding.type_name,
                    binding.field_name
                );
                continue;
            }

            let key = (binding.type_name.clone(), binding.field_name.clone());
            if let Some(existing) = self.resolvers.get(&key) {
                log_schema_warn!(
                    "Service '{}' binds {}.{} already bound by '{}'; keeping the first binding",
                    owner,
                    binding.type_name,
                    binding.field_name,
                    existing.owner
                );
                continue;
            }

            self.resolvers.insert(
                key,
                WiredResolver {
                    owner: owner.to_string(),
                    resolver: binding.resolver.clone(),
                },
            );
        }
    }

    pub(crate) fn get(&self, type_name: &str, field_name: &str) -> Option<&WiredResolver> {
        self.resolvers
            .get(&(type_name.to_string(), field_name.to_string()))
    }

    /// Service that owns the binding of `type_name.field_name`.
    pub fn owner_of(&self, type_name: &str, field_name: &str) -> Option<&str> {
        self.get(type_name, field_name)
            .map(|wired| wired.owner.as_str())
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::parser::parse_schema;
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::default();
        registry
            .merge(parse_schema("type Query { a: Int, b: Int }").unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn first_binding_wins() {
        let registry = registry();
        let mut wiring = Wiring::default();
        let first = Bindings::new().with("Query", "a", resolver_fn(|_| Ok(json!(1))));
        let second = Bindings::new()
            .with("Query", "a", resolver_fn(|_| Ok(json!(2))))
            .with("Query", "b", resolver_fn(|_| Ok(json!(3))));

        wiring.absorb("first", &first, &registry);
        wiring.absorb("second", &second, &registry);

        assert_eq!(wiring.owner_of("Query", "a"), Some("first"));
        assert_eq!(wiring.owner_of("Query", "b"), Some("second"));
    }

    #[test]
    fn drops_bindings_for_unknown_fields() {
        let registry = registry();
        let mut wiring = Wiring::default();
        let bindings = Bindings::new().with("Query", "missing", resolver_fn(|_| Ok(Value::Null)));
        wiring.absorb("svc", &bindings, &registry);
        assert!(wiring.is_empty());
    }

    #[test]
    fn panic_payload_becomes_message() {
        let error = ResolverError::from_panic(Box::new("boom"));
        assert_eq!(error.message(), "boom");
        assert!(error.code().is_none());
    }

    #[test]
    fn unexpected_keeps_source_chain() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let error = ResolverError::unexpected(&Outer(std::io::Error::other("disk gone")));
        assert_eq!(error.message(), "outer");
        assert!(error.trace().unwrap().contains("Caused by: disk gone"));
    }
}
