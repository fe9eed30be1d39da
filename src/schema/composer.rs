use super::builder::build_executable;
use super::fragment::{ServiceFragment, ServiceRegistry};
use super::registry::TypeRegistry;
use super::resolver::{Bindings, Wiring};
use super::{FragmentError, SchemaError};
use crate::{log_schema_debug, log_schema_info, log_schema_warn};
use async_graphql::dynamic::Schema;
use async_graphql::parser::parse_schema;
use async_graphql::parser::types::{ServiceDocument, TypeSystemDefinition};
use std::fmt;
use std::path::Path;

/// Owner recorded for bindings that come with the core definition.
pub const CORE_OWNER: &str = "core";

/// The fixed part of the schema. It must parse, define the query root and be
/// self-contained.
#[derive(Debug, Clone)]
pub struct CoreDefinition {
    pub text: String,
    pub bindings: Bindings,
}

impl CoreDefinition {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bindings: Bindings::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::new(text))
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }
}

/// A fragment left out of the composed schema and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFragment {
    pub service_id: String,
    pub reason: FragmentError,
}

/// The executable schema together with the composition report.
pub struct ComposedSchema {
    executable: Schema,
    registry: TypeRegistry,
    wiring: Wiring,
    accepted: Vec<String>,
    rejected: Vec<RejectedFragment>,
}

impl fmt::Debug for ComposedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedSchema")
            .field("types", &self.registry.len())
            .field("bindings", &self.wiring.len())
            .field("accepted", &self.accepted)
            .field("rejected", &self.rejected)
            .finish()
    }
}

impl ComposedSchema {
    pub fn executable(&self) -> &Schema {
        &self.executable
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Ids of the services whose fragments made it into the schema.
    pub fn accepted_services(&self) -> &[String] {
        &self.accepted
    }

    pub fn rejected_services(&self) -> &[RejectedFragment] {
        &self.rejected
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn has_field(&self, type_name: &str, field_name: &str) -> bool {
        self.registry.has_field(type_name, field_name)
    }

    /// Service whose resolver serves `type_name.field_name`.
    pub fn binding_owner(&self, type_name: &str, field_name: &str) -> Option<&str> {
        self.wiring.owner_of(type_name, field_name)
    }

    /// SDL of the composed schema.
    pub fn sdl(&self) -> String {
        self.executable.sdl()
    }
}

/// Composes the core definition with the fragments of a [`ServiceRegistry`].
pub struct SchemaComposer {
    core: CoreDefinition,
}

impl SchemaComposer {
    pub fn new(core: CoreDefinition) -> Self {
        Self { core }
    }

    pub fn compose(&self, services: &ServiceRegistry) -> Result<ComposedSchema, SchemaError> {
        compose(&self.core, services.retrieve())
    }
}

/// Compose `core` with already retrieved fragments, keyed by service id.
///
/// Fragments are merged in order. A fragment that fails to merge is dropped
/// with a warning and leaves no trace in the result.
pub fn compose<I>(core: &CoreDefinition, fragments: I) -> Result<ComposedSchema, SchemaError>
where
    I: IntoIterator<Item = (String, Result<ServiceFragment, FragmentError>)>,
{
    let mut registry = core_registry(core)?;
    let mut accepted: Vec<(String, Bindings)> = Vec::new();
    let mut rejected = Vec::new();

    for (service_id, fragment) in fragments {
        match fragment.and_then(|fragment| stage(&registry, &fragment).map(|staged| (staged, fragment))) {
            Ok(((staged, subscriptions), fragment)) => {
                if subscriptions {
                    log_schema_warn!(
                        "Service '{}' declares subscriptions; they are not served",
                        service_id
                    );
                }
                log_schema_debug!("Merged schema fragment of service '{}'", service_id);
                registry = staged;
                accepted.push((service_id, fragment.bindings));
            }
            Err(reason) => {
                log_schema_warn!(
                    "Skipping schema fragment of service '{}': {}",
                    service_id,
                    reason
                );
                rejected.push(RejectedFragment { service_id, reason });
            }
        }
    }

    let mut wiring = Wiring::default();
    wiring.absorb(CORE_OWNER, &core.bindings, &registry);
    for (service_id, bindings) in &accepted {
        wiring.absorb(service_id, bindings, &registry);
    }

    let executable = build_executable(&registry, &wiring).map_err(SchemaError::Build)?;

    log_schema_info!(
        "Composed schema with {} types ({} services accepted, {} rejected)",
        registry.len(),
        accepted.len(),
        rejected.len()
    );

    Ok(ComposedSchema {
        executable,
        registry,
        wiring,
        accepted: accepted.into_iter().map(|(id, _)| id).collect(),
        rejected,
    })
}

fn core_registry(core: &CoreDefinition) -> Result<TypeRegistry, SchemaError> {
    let document =
        parse_schema(&core.text).map_err(|e| SchemaError::CoreDefinition(e.to_string()))?;

    let mut registry = TypeRegistry::default();
    registry
        .merge(document)
        .map_err(|e| SchemaError::CoreDefinition(e.to_string()))?;

    if !registry.contains(registry.query_type()) {
        return Err(SchemaError::MissingQueryType(
            registry.query_type().to_string(),
        ));
    }

    let missing = registry.unresolved_references();
    if !missing.is_empty() {
        return Err(SchemaError::UnknownTypes(missing));
    }

    build_executable(&registry, &Wiring::default()).map_err(SchemaError::Build)?;
    Ok(registry)
}

/// Merge `fragment` into a copy of `registry`; the copy is returned only when
/// the result is still a valid schema, together with whether the fragment
/// itself declares subscriptions.
fn stage(
    registry: &TypeRegistry,
    fragment: &ServiceFragment,
) -> Result<(TypeRegistry, bool), FragmentError> {
    let mut staging = registry.clone();
    if fragment.definition.trim().is_empty() {
        return Ok((staging, false));
    }

    let document =
        parse_schema(&fragment.definition).map_err(|e| FragmentError::Parse(e.to_string()))?;
    let subscriptions = declares_subscriptions(&document);
    staging.merge(document)?;

    let missing = staging.unresolved_references();
    if !missing.is_empty() {
        return Err(FragmentError::UnknownTypes(missing));
    }

    build_executable(&staging, &Wiring::default()).map_err(FragmentError::Invalid)?;
    Ok((staging, subscriptions))
}

fn declares_subscriptions(document: &ServiceDocument) -> bool {
    document.definitions.iter().any(|definition| match definition {
        TypeSystemDefinition::Schema(schema) => schema.node.subscription.is_some(),
        TypeSystemDefinition::Type(definition) => {
            definition.node.name.node.as_str() == "Subscription"
        }
        TypeSystemDefinition::Directive(_) => false,
    })
}
