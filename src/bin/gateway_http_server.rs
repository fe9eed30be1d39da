use clap::Parser;
use log::info;
use query_gateway::gateway_node::{load_gateway_config, GatewayHttpServer};
use query_gateway::logging::LoggingSystem;
use query_gateway::schema::SchemaComposer;
use query_gateway::services::{builtin_registry, core_definition, ServerInfo};
use std::sync::Arc;

/// Command line options for the gateway server binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the gateway configuration file
    #[arg(long, env = "GATEWAY_CONFIG", default_value = "config/gateway.toml")]
    config: String,

    /// Port for the HTTP server (overrides the configured bind address port)
    #[arg(long)]
    port: Option<u16>,

    /// Enable development mode (console, schema download, CORS)
    #[arg(long)]
    devel: bool,
}

/// Main entry point for the gateway HTTP server.
///
/// Loads the configuration, composes the schema from the core definition and
/// the bundled services, and serves it until the process is stopped.
///
/// # Errors
///
/// Returns an error if:
/// * The configuration file cannot be read or parsed
/// * The core schema cannot be composed
/// * The HTTP server cannot be started
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Err(e) = LoggingSystem::init_default() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!("Starting query gateway...");

    let mut config = load_gateway_config(Some(&cli.config), cli.port)?;
    if cli.devel {
        config = config.with_devel_mode(true);
    }
    info!("Config loaded successfully");

    let info = Arc::new(ServerInfo::new(&config));
    let core = core_definition(&config, info.clone())?;
    let schema = SchemaComposer::new(core).compose(&builtin_registry())?;
    info.record_services(&schema);
    for rejected in schema.rejected_services() {
        info!(
            "Service '{}' is not part of the schema: {}",
            rejected.service_id, rejected.reason
        );
    }

    let server = GatewayHttpServer::new(Arc::new(schema), &config);
    server.run().await?;

    Ok(())
}
