//! Development helpers: schema download, the query console, and CORS
//! preflight.

use super::http_server::AppState;
use super::query_routes::{execute_get, execute_single};
use crate::execution::RequestEnvelope;
use actix_web::{web, HttpRequest, HttpResponse};
use async_graphql::http::GraphiQLSource;

/// Introspection query answered by `GET /schema.json`.
pub const SCHEMA_READ_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType { kind name }
            }
          }
        }
      }
    }
  }
}
"#;

/// Introspection result of the composed schema. Outside development mode this
/// path is an ordinary GET query.
pub async fn schema_json(request: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if !state.devel_mode {
        return execute_get(request, state).await;
    }
    execute_single(&request, &state, RequestEnvelope::new(SCHEMA_READ_QUERY)).await
}

/// GraphiQL console pointed at the endpoint. Outside development mode this
/// path is an ordinary GET query.
pub async fn console(request: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if !state.devel_mode {
        return execute_get(request, state).await;
    }
    let page = GraphiQLSource::build().endpoint(&state.endpoint).finish();
    let mut response = HttpResponse::Ok();
    response.content_type("text/html; charset=utf-8");
    state.cors.apply(&request, &mut response);
    response.body(page)
}

/// `OPTIONS` on any path: CORS headers only.
pub async fn preflight(request: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    state.cors.apply(&request, &mut response);
    response.finish()
}
