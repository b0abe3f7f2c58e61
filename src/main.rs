// Initialize configuration
// Set up logging
// Create provider client and graph renderer
// Create session registry and shared state
// Start HTTP server with graceful shutdown

use chain_investigator::{
    api, config::Config, graph::GraphvizRenderer, service::session::ArtifactBackend,
    state::AppState, MistTrackClient, SessionRegistry,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chain-investigator");

    // Load configuration
    let config = Config::from_env();
    info!(
        "Configuration loaded: provider {}, api key {}",
        config.provider_base_url,
        if config.api_key.is_some() { "set" } else { "missing" }
    );

    let provider = Arc::new(MistTrackClient::new(&config)?);
    let renderer = Arc::new(GraphvizRenderer::new(config.graphviz_bin.clone()));
    let sessions = SessionRegistry::new(
        provider,
        renderer,
        ArtifactBackend::Disk(config.artifact_root.clone()),
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        sessions,
    });

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    // Start HTTP server
    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}
