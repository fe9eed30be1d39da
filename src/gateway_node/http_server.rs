use super::config::GatewayConfig;
use super::cors::DevCorsNegotiator;
use super::{dev_routes, query_routes};
use crate::error::{GatewayError, GatewayResult};
use crate::execution::{ExecutionEngine, ExecutionOptions};
use crate::log_http_info;
use crate::schema::ComposedSchema;
use actix_web::{guard, web, App, HttpServer as ActixHttpServer};
use std::sync::Arc;

/// Largest request body accepted, in bytes.
const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// HTTP front end of the gateway.
///
/// Serves the query endpoint at `/`. In development mode it also serves the
/// schema download and the query console and answers with CORS headers.
pub struct GatewayHttpServer {
    state: web::Data<AppState>,
    bind_address: String,
}

/// Shared application state for the HTTP server.
pub struct AppState {
    /// Executes queries against the composed schema
    pub engine: ExecutionEngine,
    /// Development-mode CORS negotiation
    pub cors: DevCorsNegotiator,
    pub devel_mode: bool,
    /// Path the console sends queries to
    pub endpoint: String,
}

impl AppState {
    pub fn new(schema: Arc<ComposedSchema>, config: &GatewayConfig) -> Self {
        let options = ExecutionOptions {
            timeout: config.query_timeout(),
            expose_detail: config.exposes_error_detail(),
        };
        Self {
            engine: ExecutionEngine::new(schema, options),
            cors: DevCorsNegotiator::new(config.devel_mode, &config.cors_allow_headers),
            devel_mode: config.devel_mode,
            endpoint: "/".to_string(),
        }
    }
}

impl GatewayHttpServer {
    pub fn new(schema: Arc<ComposedSchema>, config: &GatewayConfig) -> Self {
        Self {
            state: web::Data::new(AppState::new(schema, config)),
            bind_address: config.bind_address.clone(),
        }
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Run the HTTP server until it is stopped.
    pub async fn run(&self) -> GatewayResult<()> {
        log_http_info!(
            "Gateway listening on {} (development mode: {})",
            self.bind_address,
            self.state.devel_mode
        );

        let state = self.state.clone();
        ActixHttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .app_data(web::PayloadConfig::new(MAX_PAYLOAD_SIZE))
                .configure(configure_routes)
        })
        .bind(&self.bind_address)
        .map_err(|e| GatewayError::Server(format!("Failed to bind HTTP server: {}", e)))?
        .run()
        .await
        .map_err(|e| GatewayError::Server(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}

/// Register the gateway routes. `AppState` must be registered as app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{tail:.*}")
            .guard(guard::Options())
            .to(dev_routes::preflight),
    )
    .service(
        web::resource("/")
            .route(web::post().to(query_routes::execute_post))
            .route(web::get().to(query_routes::execute_get)),
    )
    .service(web::resource("/schema.json").route(web::get().to(dev_routes::schema_json)))
    .service(web::resource("/console").route(web::get().to(dev_routes::console)));
}
