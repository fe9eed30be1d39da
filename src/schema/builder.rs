//! Compiles a [`TypeRegistry`] into an executable `async-graphql` dynamic schema.
//!
//! Values flow between fields as `serde_json::Value`s: a bound resolver returns
//! JSON for its field, and fields without a binding read the property of the
//! same name from the parent value.

use super::registry::{TypeCategory, TypeRegistry, BUILTIN_SCALARS};
use super::resolver::{FieldCall, FieldResolver, ResolverError, Wiring};
use crate::execution::context::ExecutionContext;
use crate::log_query_debug;
use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema, TypeRef, Union,
};
use async_graphql::parser::types::{
    BaseType, ConstDirective, FieldDefinition, InputValueDefinition, Type, TypeKind,
};
use async_graphql::parser::Positioned;
use async_graphql::{Error, Name, Value as ConstValue};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

static NULL: Value = Value::Null;

/// How a field's JSON value is handed back to the engine.
#[derive(Debug, Clone)]
enum OutputShape {
    List(Box<OutputShape>),
    Scalar,
    Enum,
    Object,
    /// Interface or union; the concrete type comes from `__typename`.
    Abstract,
}

impl OutputShape {
    fn of(ty: &Type, registry: &TypeRegistry) -> Self {
        match &ty.base {
            BaseType::List(inner) => OutputShape::List(Box::new(OutputShape::of(inner, registry))),
            BaseType::Named(name) => match registry.category(name) {
                Some(TypeCategory::Enum) => OutputShape::Enum,
                Some(TypeCategory::Object) => OutputShape::Object,
                Some(TypeCategory::Interface) | Some(TypeCategory::Union) => OutputShape::Abstract,
                _ => OutputShape::Scalar,
            },
        }
    }
}

/// Build the executable schema for `registry`, wiring bound fields to their
/// resolvers.
pub fn build_executable(registry: &TypeRegistry, wiring: &Wiring) -> Result<Schema, String> {
    let mut builder = Schema::build(registry.query_type(), registry.mutation_type(), None);

    for definition in registry.types() {
        let name = definition.name.node.as_str();
        let description = definition.description.as_ref().map(|d| d.node.as_str());

        builder = match &definition.kind {
            TypeKind::Scalar => {
                if BUILTIN_SCALARS.contains(&name) {
                    continue;
                }
                let mut scalar = Scalar::new(name);
                if let Some(description) = description {
                    scalar = scalar.description(description);
                }
                builder.register(scalar)
            }
            TypeKind::Object(object) => {
                let mut compiled = Object::new(name);
                if let Some(description) = description {
                    compiled = compiled.description(description);
                }
                for interface in &object.implements {
                    compiled = compiled.implement(interface.node.as_str());
                }
                for field in &object.fields {
                    compiled = compiled.field(output_field(name, &field.node, registry, wiring));
                }
                builder.register(compiled)
            }
            TypeKind::Interface(interface) => {
                let mut compiled = Interface::new(name);
                if let Some(description) = description {
                    compiled = compiled.description(description);
                }
                for field in &interface.fields {
                    compiled = compiled.field(interface_field(&field.node));
                }
                builder.register(compiled)
            }
            TypeKind::Union(union) => {
                let mut compiled = Union::new(name);
                if let Some(description) = description {
                    compiled = compiled.description(description);
                }
                for member in &union.members {
                    compiled = compiled.possible_type(member.node.as_str());
                }
                builder.register(compiled)
            }
            TypeKind::Enum(values) => {
                let mut compiled = Enum::new(name);
                if let Some(description) = description {
                    compiled = compiled.description(description);
                }
                for value in &values.values {
                    let value = &value.node;
                    let mut item = EnumItem::new(value.value.node.as_str());
                    if let Some(description) = &value.description {
                        item = item.description(description.node.as_str());
                    }
                    if let Some(reason) = deprecation(&value.directives) {
                        item = item.deprecation(Some(reason.as_str()));
                    }
                    compiled = compiled.item(item);
                }
                builder.register(compiled)
            }
            TypeKind::InputObject(input) => {
                let mut compiled = InputObject::new(name);
                if let Some(description) = description {
                    compiled = compiled.description(description);
                }
                for field in &input.fields {
                    compiled = compiled.field(input_value(&field.node));
                }
                builder.register(compiled)
            }
        };
    }

    builder.finish().map_err(|e| e.to_string())
}

fn output_field(
    type_name: &str,
    definition: &FieldDefinition,
    registry: &TypeRegistry,
    wiring: &Wiring,
) -> Field {
    let field_name = definition.name.node.to_string();
    let shape = Arc::new(OutputShape::of(&definition.ty.node, registry));
    let resolver = wiring
        .get(type_name, &field_name)
        .map(|wired| wired.resolver.clone());
    let owner_type = type_name.to_string();
    let key = field_name.clone();
    let nullable = definition.ty.node.nullable;

    let mut field = Field::new(
        field_name,
        type_ref(&definition.ty.node),
        move |ctx| {
            let shape = shape.clone();
            let resolver = resolver.clone();
            let owner_type = owner_type.clone();
            let key = key.clone();
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<Value>().unwrap_or(&NULL);
                let value = match resolver {
                    Some(resolver) => invoke(&ctx, resolver, &owner_type, &key, parent).await,
                    None => Ok(parent.get(&key).cloned().unwrap_or(Value::Null)),
                };
                match value.and_then(|value| field_value(&shape, value)) {
                    Ok(value) => Ok(value),
                    Err(error) => fail_field(&ctx, error, nullable),
                }
            })
        },
    );

    if let Some(description) = &definition.description {
        field = field.description(description.node.as_str());
    }
    if let Some(reason) = deprecation(&definition.directives) {
        field = field.deprecation(Some(reason.as_str()));
    }
    for argument in &definition.arguments {
        field = field.argument(input_value(&argument.node));
    }
    field
}

async fn invoke(
    ctx: &ResolverContext<'_>,
    resolver: Arc<dyn FieldResolver>,
    type_name: &str,
    field_name: &str,
    parent: &Value,
) -> async_graphql::Result<Value> {
    let context = ctx.data::<ExecutionContext>()?;
    let call = FieldCall {
        type_name,
        field_name,
        parent,
        arguments: arguments_json(ctx)?,
        context,
    };

    let failure = match AssertUnwindSafe(resolver.resolve(call)).catch_unwind().await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error,
        Err(panic) => ResolverError::from_panic(panic),
    };

    log_query_debug!(
        "Resolver for {}.{} failed: {}",
        type_name,
        field_name,
        failure.message()
    );
    Err(Error::new_with_source(failure))
}

/// Marker carried by the error a failed non-null field hands to its parent
/// selection. The failure itself has already been reported with its path.
#[derive(Debug, Clone, Copy)]
pub struct PropagatedFailure;

impl std::fmt::Display for PropagatedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("non-null field failed")
    }
}

/// Report a field failure at the field's path. Nullable fields resolve to
/// null so their siblings are kept; non-null fields fail the parent selection.
fn fail_field<'a>(
    ctx: &ResolverContext<'_>,
    error: Error,
    nullable: bool,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    ctx.add_error(ctx.set_error_path(error.into_server_error(ctx.item.pos)));
    if nullable {
        Ok(None)
    } else {
        Err(Error::new_with_source(PropagatedFailure))
    }
}

fn arguments_json(ctx: &ResolverContext<'_>) -> async_graphql::Result<Map<String, Value>> {
    let mut arguments = Map::new();
    for (name, value) in ctx.args.as_index_map() {
        arguments.insert(name.to_string(), value.clone().into_json()?);
    }
    Ok(arguments)
}

fn field_value<'a>(shape: &OutputShape, value: Value) -> async_graphql::Result<Option<FieldValue<'a>>> {
    if value.is_null() {
        return Ok(None);
    }

    match shape {
        OutputShape::List(inner) => {
            let Value::Array(items) = value else {
                return Err(Error::new(format!("expected a list, got {}", value)));
            };
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(field_value(inner, item)?.unwrap_or(FieldValue::NULL));
            }
            Ok(Some(FieldValue::list(values)))
        }
        OutputShape::Scalar => Ok(Some(FieldValue::value(ConstValue::from_json(value)?))),
        OutputShape::Enum => match value {
            Value::String(name) => Ok(Some(FieldValue::value(ConstValue::Enum(Name::new(name))))),
            other => Err(Error::new(format!("expected an enum value, got {}", other))),
        },
        OutputShape::Object => Ok(Some(FieldValue::owned_any(value))),
        OutputShape::Abstract => {
            let concrete = value
                .get("__typename")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::new("abstract value does not carry a __typename"))?;
            Ok(Some(FieldValue::owned_any(value).with_type(concrete)))
        }
    }
}

fn interface_field(definition: &FieldDefinition) -> InterfaceField {
    let mut field = InterfaceField::new(
        definition.name.node.as_str(),
        type_ref(&definition.ty.node),
    );
    if let Some(description) = &definition.description {
        field = field.description(description.node.as_str());
    }
    if let Some(reason) = deprecation(&definition.directives) {
        field = field.deprecation(Some(reason.as_str()));
    }
    for argument in &definition.arguments {
        field = field.argument(input_value(&argument.node));
    }
    field
}

fn input_value(definition: &InputValueDefinition) -> InputValue {
    let mut value = InputValue::new(definition.name.node.as_str(), type_ref(&definition.ty.node));
    if let Some(description) = &definition.description {
        value = value.description(description.node.as_str());
    }
    if let Some(default) = &definition.default_value {
        value = value.default_value(default.node.clone());
    }
    value
}

fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.to_string()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

/// Reason carried by a `@deprecated` directive, if present.
fn deprecation(directives: &[Positioned<ConstDirective>]) -> Option<String> {
    let directive = directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == "deprecated")?;
    let reason = directive
        .node
        .arguments
        .iter()
        .find(|(name, _)| name.node.as_str() == "reason")
        .and_then(|(_, value)| match &value.node {
            ConstValue::String(reason) => Some(reason.clone()),
            _ => None,
        });
    Some(reason.unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_string()))
}
