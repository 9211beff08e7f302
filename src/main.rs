//! knockout-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use knockout_gateway::api;
use knockout_gateway::app_state::AppState;
use knockout_gateway::backend::HttpBackend;
use knockout_gateway::config::GatewayConfig;
use knockout_gateway::domain::EventBus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(
        addr = %config.listen_addr,
        backend = %config.backend_url,
        "starting knockout-gateway"
    );

    // Tournament backend
    let backend = HttpBackend::new(config.backend_url.clone(), config.backend_timeout())
        .context("building backend client")?;

    // Build application state
    let event_bus = EventBus::new(config.event_bus_capacity);
    let app_state = AppState::new(Arc::new(backend), event_bus, config.officiating());

    // Build router
    let app = api::build_app(app_state, config.request_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
