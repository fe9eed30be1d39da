//! Shared fixtures for the gateway integration tests.
//!
//! Provides a small composed schema with a handful of services whose resolvers
//! succeed, fail with domain or unexpected errors, panic, stall, or write to the
//! transport response.

#![allow(dead_code)]

use async_trait::async_trait;
use query_gateway::execution::{ExecutionContext, RequestSnapshot, ResponseHandle};
use query_gateway::gateway_node::{AppState, GatewayConfig};
use query_gateway::schema::{
    compose, resolver_fn, Bindings, ComposedSchema, CoreDefinition, FieldCall, FieldResolver,
    FragmentError, GatewayService, ResolverError, ServiceFragment, ServiceRegistry,
};
use query_gateway::services::SystemService;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const CORE_SDL: &str = "type Query { version: String! }";

pub fn core() -> CoreDefinition {
    CoreDefinition::new(CORE_SDL).with_bindings(Bindings::new().with(
        "Query",
        "version",
        resolver_fn(|_| Ok(json!("1.0"))),
    ))
}

/// Service backed by fixed SDL and bindings.
pub struct StaticService {
    pub id: &'static str,
    pub definition: &'static str,
    pub bindings: Bindings,
}

impl StaticService {
    pub fn new(id: &'static str, definition: &'static str) -> Self {
        Self {
            id,
            definition,
            bindings: Bindings::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }
}

impl GatewayService for StaticService {
    fn id(&self) -> &str {
        self.id
    }

    fn fragment(&self) -> Result<Option<ServiceFragment>, FragmentError> {
        Ok(Some(
            ServiceFragment::new(self.definition).with_bindings(self.bindings.clone()),
        ))
    }
}

/// Service whose fragment can never be retrieved.
pub struct UnreachableService;

impl GatewayService for UnreachableService {
    fn id(&self) -> &str {
        "unreachable"
    }

    fn fragment(&self) -> Result<Option<ServiceFragment>, FragmentError> {
        Err(FragmentError::Retrieval("bundle not installed".to_string()))
    }
}

pub const CONNECTIONS_SDL: &str = r#"
enum Driver { POSTGRES MYSQL }

type Connection {
    id: ID!
    name: String!
    driver: Driver
}

extend type Query {
    connection(id: ID!): Connection
    connections: [Connection!]!
}
"#;

fn connection(id: &str) -> Option<Value> {
    match id {
        "1" => Some(json!({"id": "1", "name": "Main", "driver": "POSTGRES"})),
        "2" => Some(json!({"id": "2", "name": "Reports", "driver": "MYSQL"})),
        _ => None,
    }
}

pub fn connections_service() -> StaticService {
    StaticService::new("connections", CONNECTIONS_SDL).with_bindings(
        Bindings::new()
            .with(
                "Query",
                "connection",
                resolver_fn(|call| {
                    let id: String = call.required_argument("id")?;
                    connection(&id).ok_or_else(|| {
                        ResolverError::domain(
                            "E_NOT_FOUND",
                            format!("Connection {} not found", id),
                        )
                    })
                }),
            )
            .with(
                "Query",
                "connections",
                resolver_fn(|_| Ok(json!([connection("1"), connection("2")]))),
            ),
    )
}

/// Resolver that finishes only after `delay`.
pub struct SlowResolver {
    pub delay: Duration,
}

#[async_trait]
impl FieldResolver for SlowResolver {
    async fn resolve(&self, _call: FieldCall<'_>) -> Result<Value, ResolverError> {
        tokio::time::sleep(self.delay).await;
        Ok(json!("finally"))
    }
}

pub fn faults_service() -> StaticService {
    StaticService::new(
        "faults",
        "extend type Query { broken: String, panicking: String, slow: String, required: String! }",
    )
    .with_bindings(
        Bindings::new()
            .with(
                "Query",
                "broken",
                resolver_fn(|_| {
                    Err(ResolverError::Generic {
                        message: "database unavailable".to_string(),
                        trace: Some("at pool.acquire".to_string()),
                    })
                }),
            )
            .with(
                "Query",
                "panicking",
                resolver_fn(|_| -> Result<Value, ResolverError> { panic!("resolver exploded") }),
            )
            .with(
                "Query",
                "slow",
                SlowResolver {
                    delay: Duration::from_millis(500),
                },
            )
            .with(
                "Query",
                "required",
                resolver_fn(|_| Err(ResolverError::generic("value unavailable"))),
            ),
    )
}

pub const CATALOG_SDL: &str = r#"
type Item {
    id: ID!
    label: String
}

extend type Query {
    items: [Item!]!
}
"#;

/// Three items; resolving the label of the second one fails.
pub fn catalog_service() -> StaticService {
    StaticService::new("catalog", CATALOG_SDL).with_bindings(
        Bindings::new()
            .with(
                "Query",
                "items",
                resolver_fn(|_| Ok(json!([{"id": "1"}, {"id": "2"}, {"id": "3"}]))),
            )
            .with(
                "Item",
                "label",
                resolver_fn(|call| match call.parent["id"].as_str() {
                    Some("2") => Err(ResolverError::domain("E_NOT_FOUND", "Label of item 2 not found")),
                    Some(id) => Ok(json!(format!("item {}", id))),
                    None => Ok(Value::Null),
                }),
            ),
    )
}

pub fn session_service() -> StaticService {
    StaticService::new("session", "extend type Query { login(user: String!): Boolean! }")
        .with_bindings(Bindings::new().with(
            "Query",
            "login",
            resolver_fn(|call| {
                let user: String = call.required_argument("user")?;
                let response = call.context.response();
                response.insert_header("X-Session-User", &user);
                response.add_cookie(actix_web::cookie::Cookie::new("session", user));
                Ok(json!(true))
            }),
        ))
}

pub fn registry() -> ServiceRegistry {
    ServiceRegistry::new()
        .with(connections_service())
        .with(faults_service())
        .with(session_service())
        .with(catalog_service())
        .with(SystemService)
}

pub fn schema() -> Arc<ComposedSchema> {
    Arc::new(compose(&core(), registry().retrieve()).expect("test schema composes"))
}

pub fn context() -> ExecutionContext {
    ExecutionContext::new(
        RequestSnapshot::new("POST", "/").with_header("User-Agent", "gateway-tests"),
        ResponseHandle::new(),
    )
}

pub fn app_state(config: &GatewayConfig) -> actix_web::web::Data<AppState> {
    actix_web::web::Data::new(AppState::new(schema(), config))
}

pub fn production() -> GatewayConfig {
    GatewayConfig::default()
}

pub fn development() -> GatewayConfig {
    GatewayConfig::default().with_devel_mode(true)
}
