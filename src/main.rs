//! realtime-hub server entry point.
//!
//! Starts the hub control loop and the Axum HTTP server with REST and
//! WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use realtime_hub::app_state::AppState;
use realtime_hub::auth::TokenVerifier;
use realtime_hub::config::HubConfig;
use realtime_hub::hub::Hub;
use realtime_hub::server::{build_app, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = HubConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        addr = %config.listen_addr,
        queue_capacity = config.client_queue_capacity,
        heartbeat = ?config.liveness.heartbeat_interval,
        read_deadline = ?config.liveness.read_deadline,
        "starting realtime-hub"
    );

    // Start the hub
    let (hub, hub_task) = Hub::spawn(config.control_capacity);

    // Build application state
    let app_state = AppState {
        hub: hub.clone(),
        verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
        clients: config.client_settings(),
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, build_app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Disconnect remaining clients
    hub.shutdown().await;
    hub_task.await.context("hub control loop panicked")?;
    tracing::info!("realtime-hub stopped");

    Ok(())
}
