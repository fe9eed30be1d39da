mod common;

use common::{
    connections_service, context, core, faults_service, StaticService, UnreachableService,
    CORE_SDL,
};
use query_gateway::execution::{execute, RequestEnvelope};
use query_gateway::schema::{
    compose, resolver_fn, Bindings, CoreDefinition, FragmentError, SchemaComposer, SchemaError,
    ServiceRegistry,
};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn core_alone_composes_and_executes() {
    let schema = SchemaComposer::new(core())
        .compose(&ServiceRegistry::new())
        .unwrap();
    assert!(schema.accepted_services().is_empty());
    assert!(schema.rejected_services().is_empty());

    let result = execute(Arc::new(schema), RequestEnvelope::new("{ version }"), context()).await;
    assert!(result.is_ok());
    assert_eq!(result.data, Some(json!({"version": "1.0"})));
}

#[tokio::test]
async fn redefining_fragment_is_skipped() {
    let registry = ServiceRegistry::new()
        .with(StaticService::new("imposter", "type Query { hijacked: String }"))
        .with(connections_service());

    let schema = SchemaComposer::new(core()).compose(&registry).unwrap();
    assert_eq!(schema.accepted_services(), ["connections".to_string()]);
    assert_eq!(schema.rejected_services().len(), 1);
    assert_eq!(schema.rejected_services()[0].service_id, "imposter");
    assert_eq!(
        schema.rejected_services()[0].reason,
        FragmentError::DuplicateType("Query".to_string())
    );
    assert!(!schema.has_field("Query", "hijacked"));

    let result = execute(
        Arc::new(schema),
        RequestEnvelope::new("{ version connections { name } }"),
        context(),
    )
    .await;
    assert_eq!(
        result.data,
        Some(json!({"version": "1.0", "connections": [{"name": "Main"}, {"name": "Reports"}]}))
    );
}

#[test]
fn retrieval_failure_is_skipped() {
    let registry = ServiceRegistry::new()
        .with(UnreachableService)
        .with(faults_service());

    let schema = SchemaComposer::new(core()).compose(&registry).unwrap();
    assert_eq!(schema.accepted_services(), ["faults".to_string()]);
    assert!(matches!(
        schema.rejected_services()[0].reason,
        FragmentError::Retrieval(_)
    ));
}

#[test]
fn unknown_type_reference_rejects_fragment() {
    let registry = ServiceRegistry::new().with(StaticService::new(
        "sessions",
        "type Session { user: User } extend type Query { session: Session }",
    ));

    let schema = SchemaComposer::new(core()).compose(&registry).unwrap();
    assert!(!schema.has_type("Session"));
    assert_eq!(
        schema.rejected_services()[0].reason,
        FragmentError::UnknownTypes(vec!["User".to_string()])
    );
}

#[test]
fn malformed_fragment_is_skipped() {
    let registry = ServiceRegistry::new()
        .with(StaticService::new("broken", "extend type Query {"))
        .with(connections_service());

    let schema = SchemaComposer::new(core()).compose(&registry).unwrap();
    assert!(matches!(
        schema.rejected_services()[0].reason,
        FragmentError::Parse(_)
    ));
    assert!(schema.has_field("Query", "connection"));
}

#[test]
fn extension_adds_query_fields() {
    let schema = compose(
        &core(),
        ServiceRegistry::new().with(connections_service()).retrieve(),
    )
    .unwrap();
    assert!(schema.has_field("Query", "version"));
    assert!(schema.has_field("Query", "connections"));
    assert!(schema.sdl().contains("enum Driver"));
}

#[test]
fn later_fragments_see_earlier_types() {
    let registry = ServiceRegistry::new()
        .with(connections_service())
        .with(StaticService::new(
            "favorites",
            "extend type Query { favorite: Connection }",
        ));

    let schema = SchemaComposer::new(core()).compose(&registry).unwrap();
    assert_eq!(schema.accepted_services().len(), 2);
    assert!(schema.has_field("Query", "favorite"));
}

#[tokio::test]
async fn conflicting_bindings_keep_the_first() {
    let first = StaticService::new("first", "extend type Query { greeting: String }")
        .with_bindings(Bindings::new().with(
            "Query",
            "greeting",
            resolver_fn(|_| Ok(json!("hello from first"))),
        ));
    let second = StaticService::new("second", "").with_bindings(Bindings::new().with(
        "Query",
        "greeting",
        resolver_fn(|_| Ok(json!("hello from second"))),
    ));

    let schema = SchemaComposer::new(core())
        .compose(&ServiceRegistry::new().with(first).with(second))
        .unwrap();
    assert_eq!(schema.binding_owner("Query", "greeting"), Some("first"));

    let result = execute(Arc::new(schema), RequestEnvelope::new("{ greeting }"), context()).await;
    assert_eq!(result.data, Some(json!({"greeting": "hello from first"})));
}

#[tokio::test]
async fn unbound_fields_read_parent_properties() {
    let schema = SchemaComposer::new(core())
        .compose(&ServiceRegistry::new().with(connections_service()))
        .unwrap();

    let result = execute(
        Arc::new(schema),
        RequestEnvelope::new(r#"{ connection(id: "2") { id name driver } }"#),
        context(),
    )
    .await;
    assert_eq!(
        result.data,
        Some(json!({"connection": {"id": "2", "name": "Reports", "driver": "MYSQL"}}))
    );
}

#[test]
fn broken_core_is_fatal() {
    let composer = SchemaComposer::new(CoreDefinition::new("type Query { version: String"));
    assert!(matches!(
        composer.compose(&ServiceRegistry::new()),
        Err(SchemaError::CoreDefinition(_))
    ));

    let composer = SchemaComposer::new(CoreDefinition::new("type Root { version: String }"));
    assert!(matches!(
        composer.compose(&ServiceRegistry::new()),
        Err(SchemaError::MissingQueryType(_))
    ));
}

#[test]
fn core_is_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.graphqls");
    std::fs::write(&path, CORE_SDL).unwrap();

    let schema = compose(&CoreDefinition::from_file(&path).unwrap(), Vec::new()).unwrap();
    assert!(schema.has_field("Query", "version"));
}

#[tokio::test]
async fn fragment_cannot_reroot_the_query_type() {
    let registry = ServiceRegistry::new().with(StaticService::new(
        "hijacker",
        "schema { query: Hijack } type Hijack { x: Int }",
    ));

    let schema = SchemaComposer::new(core()).compose(&registry).unwrap();
    assert!(schema.accepted_services().is_empty());
    assert_eq!(
        schema.rejected_services()[0].reason,
        FragmentError::RootConflict {
            operation: "query",
            existing: "Query".to_string(),
        }
    );
    assert!(!schema.has_type("Hijack"));

    let result = execute(Arc::new(schema), RequestEnvelope::new("{ version }"), context()).await;
    assert_eq!(result.data, Some(json!({"version": "1.0"})));
}
