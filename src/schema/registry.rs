use super::FragmentError;
use crate::log_schema_debug;
use async_graphql::parser::types::{
    BaseType, FieldDefinition, InputValueDefinition, SchemaDefinition, ServiceDocument, Type,
    TypeDefinition, TypeKind, TypeSystemDefinition,
};
use async_graphql::parser::Positioned;
use async_graphql::Name;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Scalars every GraphQL schema knows without declaring them.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Kind of a named type in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeCategory {
    fn of(kind: &TypeKind) -> Self {
        match kind {
            TypeKind::Scalar => TypeCategory::Scalar,
            TypeKind::Object(_) => TypeCategory::Object,
            TypeKind::Interface(_) => TypeCategory::Interface,
            TypeKind::Union(_) => TypeCategory::Union,
            TypeKind::Enum(_) => TypeCategory::Enum,
            TypeKind::InputObject(_) => TypeCategory::InputObject,
        }
    }
}

/// Merged set of SDL type definitions plus the root operation bindings.
///
/// Definitions keep their registration order so the compiled schema (and
/// its SDL) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDefinition>,
    query: Option<String>,
    mutation: Option<String>,
    subscription: Option<String>,
}

impl TypeRegistry {
    /// Merge a parsed document into the registry.
    ///
    /// Plain definitions are added first, then `extend` definitions are applied,
    /// so a document may both declare and extend a type. On error the registry
    /// is left half-merged; callers merge into a copy they can throw away.
    pub fn merge(&mut self, document: ServiceDocument) -> Result<(), FragmentError> {
        let mut extensions = Vec::new();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Type(definition) => {
                    let definition = definition.node;
                    if definition.extend {
                        extensions.push(definition);
                        continue;
                    }
                    let name = definition.name.node.to_string();
                    if self.types.contains_key(&name) {
                        return Err(FragmentError::DuplicateType(name));
                    }
                    self.types.insert(name, definition);
                }
                TypeSystemDefinition::Schema(schema) => self.merge_roots(&schema.node)?,
                TypeSystemDefinition::Directive(directive) => {
                    log_schema_debug!(
                        "Ignoring directive definition @{}",
                        directive.node.name.node
                    );
                }
            }
        }

        for extension in extensions {
            self.extend(extension)?;
        }

        Ok(())
    }

    fn merge_roots(&mut self, schema: &SchemaDefinition) -> Result<(), FragmentError> {
        let query = self.effective_root(&self.query, "Query");
        bind_root(&mut self.query, query, "query", schema.query.as_ref())?;
        let mutation = self.effective_root(&self.mutation, "Mutation");
        bind_root(&mut self.mutation, mutation, "mutation", schema.mutation.as_ref())?;
        let subscription = self.effective_root(&self.subscription, "Subscription");
        bind_root(
            &mut self.subscription,
            subscription,
            "subscription",
            schema.subscription.as_ref(),
        )
    }

    /// Root type currently serving an operation: the declared one, or the
    /// conventionally named type once it exists.
    fn effective_root(&self, declared: &Option<String>, conventional: &str) -> Option<String> {
        declared.clone().or_else(|| {
            self.types
                .contains_key(conventional)
                .then(|| conventional.to_string())
        })
    }

    fn extend(&mut self, extension: TypeDefinition) -> Result<(), FragmentError> {
        let name = extension.name.node.to_string();
        let target = self
            .types
            .get_mut(&name)
            .ok_or_else(|| FragmentError::UnknownExtensionTarget(name.clone()))?;

        match (&mut target.kind, extension.kind) {
            (TypeKind::Object(target), TypeKind::Object(addition)) => {
                merge_names(&mut target.implements, addition.implements);
                append_unique(&name, &mut target.fields, addition.fields, |f: &FieldDefinition| {
                    &f.name.node
                })?;
            }
            (TypeKind::Interface(target), TypeKind::Interface(addition)) => {
                merge_names(&mut target.implements, addition.implements);
                append_unique(&name, &mut target.fields, addition.fields, |f: &FieldDefinition| {
                    &f.name.node
                })?;
            }
            (TypeKind::InputObject(target), TypeKind::InputObject(addition)) => {
                append_unique(
                    &name,
                    &mut target.fields,
                    addition.fields,
                    |f: &InputValueDefinition| &f.name.node,
                )?;
            }
            (TypeKind::Enum(target), TypeKind::Enum(addition)) => {
                append_unique(&name, &mut target.values, addition.values, |v| &v.value.node)?;
            }
            (TypeKind::Union(target), TypeKind::Union(addition)) => {
                append_unique(&name, &mut target.members, addition.members, |m: &Name| m)?;
            }
            (TypeKind::Scalar, TypeKind::Scalar) => {}
            _ => return Err(FragmentError::ExtensionKindMismatch(name)),
        }

        target.directives.extend(extension.directives);
        Ok(())
    }

    /// Name of the query root type.
    pub fn query_type(&self) -> &str {
        self.query.as_deref().unwrap_or("Query")
    }

    /// Name of the mutation root type, if the schema has one.
    pub fn mutation_type(&self) -> Option<&str> {
        match self.mutation.as_deref() {
            Some(name) => Some(name),
            None if self.types.contains_key("Mutation") => Some("Mutation"),
            None => None,
        }
    }

    /// Name bound to the subscription root, if any fragment declared one.
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Every definition in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Kind of the named type; built-in scalars count as scalars.
    pub fn category(&self, name: &str) -> Option<TypeCategory> {
        if BUILTIN_SCALARS.contains(&name) {
            return Some(TypeCategory::Scalar);
        }
        self.types.get(name).map(|definition| TypeCategory::of(&definition.kind))
    }

    /// Whether `type_name` is an object or interface type declaring `field_name`.
    pub fn has_field(&self, type_name: &str, field_name: &str) -> bool {
        let fields = match self.types.get(type_name).map(|definition| &definition.kind) {
            Some(TypeKind::Object(object)) => &object.fields,
            Some(TypeKind::Interface(interface)) => &interface.fields,
            _ => return false,
        };
        fields
            .iter()
            .any(|field| field.node.name.node.as_str() == field_name)
    }

    /// Names referenced anywhere in the registry that no definition provides.
    pub fn unresolved_references(&self) -> Vec<String> {
        let mut missing = BTreeSet::new();
        let mut check = |name: &str| {
            if self.category(name).is_none() {
                missing.insert(name.to_string());
            }
        };

        for root in [Some(self.query_type()), self.mutation.as_deref()]
            .into_iter()
            .flatten()
        {
            check(root);
        }

        for definition in self.types.values() {
            match &definition.kind {
                TypeKind::Scalar | TypeKind::Enum(_) => {}
                TypeKind::Object(object) => {
                    object.implements.iter().for_each(|name| check(&name.node));
                    for field in &object.fields {
                        check(named_type(&field.node.ty.node));
                        for argument in &field.node.arguments {
                            check(named_type(&argument.node.ty.node));
                        }
                    }
                }
                TypeKind::Interface(interface) => {
                    interface.implements.iter().for_each(|name| check(&name.node));
                    for field in &interface.fields {
                        check(named_type(&field.node.ty.node));
                        for argument in &field.node.arguments {
                            check(named_type(&argument.node.ty.node));
                        }
                    }
                }
                TypeKind::Union(union) => {
                    union.members.iter().for_each(|member| check(&member.node));
                }
                TypeKind::InputObject(input) => {
                    for field in &input.fields {
                        check(named_type(&field.node.ty.node));
                    }
                }
            }
        }

        missing.into_iter().collect()
    }
}

/// Innermost named type of a (possibly wrapped) type reference.
pub fn named_type(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(inner) => named_type(inner),
    }
}

fn bind_root(
    slot: &mut Option<String>,
    current: Option<String>,
    operation: &'static str,
    name: Option<&Positioned<Name>>,
) -> Result<(), FragmentError> {
    let Some(name) = name else {
        return Ok(());
    };
    let name = name.node.to_string();
    match current {
        Some(existing) if existing != name => Err(FragmentError::RootConflict {
            operation,
            existing,
        }),
        _ => {
            *slot = Some(name);
            Ok(())
        }
    }
}

fn merge_names(existing: &mut Vec<Positioned<Name>>, additions: Vec<Positioned<Name>>) {
    for addition in additions {
        if !existing.iter().any(|name| name.node == addition.node) {
            existing.push(addition);
        }
    }
}

fn append_unique<T>(
    type_name: &str,
    existing: &mut Vec<Positioned<T>>,
    additions: Vec<Positioned<T>>,
    key: impl Fn(&T) -> &Name,
) -> Result<(), FragmentError> {
    for addition in additions {
        let member = key(&addition.node).to_string();
        if existing
            .iter()
            .any(|item| key(&item.node).as_str() == member)
        {
            return Err(FragmentError::DuplicateMember {
                type_name: type_name.to_string(),
                member,
            });
        }
        existing.push(addition);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::parser::parse_schema;

    fn registry(sdl: &str) -> TypeRegistry {
        let mut registry = TypeRegistry::default();
        registry.merge(parse_schema(sdl).unwrap()).unwrap();
        registry
    }

    #[test]
    fn extension_appends_fields() {
        let mut registry = registry("type Query { a: Int }");
        registry
            .merge(parse_schema("extend type Query { b: String }").unwrap())
            .unwrap();
        assert!(registry.has_field("Query", "a"));
        assert!(registry.has_field("Query", "b"));
    }

    #[test]
    fn redefinition_is_a_conflict() {
        let mut registry = registry("type Query { a: Int }");
        let err = registry
            .merge(parse_schema("type Query { b: Int }").unwrap())
            .unwrap_err();
        assert_eq!(err, FragmentError::DuplicateType("Query".to_string()));
    }

    #[test]
    fn extension_cannot_redefine_field() {
        let mut registry = registry("type Query { a: Int }");
        let err = registry
            .merge(parse_schema("extend type Query { a: String }").unwrap())
            .unwrap_err();
        assert!(matches!(err, FragmentError::DuplicateMember { .. }));
    }

    #[test]
    fn extension_of_unknown_type_is_rejected() {
        let mut registry = registry("type Query { a: Int }");
        let err = registry
            .merge(parse_schema("extend type Session { id: ID }").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            FragmentError::UnknownExtensionTarget("Session".to_string())
        );
    }

    #[test]
    fn extension_kind_must_match() {
        let mut registry = registry("type Query { a: Int } enum Color { RED }");
        let err = registry
            .merge(parse_schema("extend input Color { b: Int }").unwrap())
            .unwrap_err();
        assert_eq!(err, FragmentError::ExtensionKindMismatch("Color".to_string()));
    }

    #[test]
    fn root_rebinding_is_a_conflict() {
        let mut registry = registry("schema { query: Root } type Root { a: Int }");
        assert_eq!(registry.query_type(), "Root");
        let err = registry
            .merge(parse_schema("schema { query: Other } type Other { b: Int }").unwrap())
            .unwrap_err();
        assert!(matches!(err, FragmentError::RootConflict { .. }));
    }

    #[test]
    fn implicit_roots_cannot_be_rebound() {
        let mut registry = registry("type Query { a: Int } type Mutation { touch: Boolean }");
        let err = registry
            .merge(parse_schema("schema { query: Hijack } type Hijack { x: Int }").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            FragmentError::RootConflict {
                operation: "query",
                existing: "Query".to_string(),
            }
        );

        let err = registry
            .merge(parse_schema("schema { mutation: Other } type Other { y: Int }").unwrap())
            .unwrap_err();
        assert!(matches!(err, FragmentError::RootConflict { operation: "mutation", .. }));
    }

    #[test]
    fn naming_the_current_root_is_accepted() {
        let mut registry = registry("type Query { a: Int }");
        registry
            .merge(parse_schema("schema { query: Query }").unwrap())
            .unwrap();
        assert_eq!(registry.query_type(), "Query");
    }

    #[test]
    fn reports_unresolved_references() {
        let registry = registry("type Query { node(filter: Filter): Node, name: String }");
        assert_eq!(
            registry.unresolved_references(),
            vec!["Filter".to_string(), "Node".to_string()]
        );
    }

    #[test]
    fn mutation_root_defaults_to_mutation_type() {
        let registry = registry("type Query { a: Int } type Mutation { touch: Boolean }");
        assert_eq!(registry.mutation_type(), Some("Mutation"));
        assert_eq!(registry.category("Mutation"), Some(TypeCategory::Object));
        assert_eq!(registry.category("ID"), Some(TypeCategory::Scalar));
    }
}
