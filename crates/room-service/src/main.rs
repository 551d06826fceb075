//! Room Service
//!
//! Real-time room coordination for Huddle: issues media transport access
//! tokens and keeps the authoritative membership and host state of every
//! room over WebSocket connections.

use room_service::actors::SessionCoordinatorHandle;
use room_service::config::Config;
use room_service::observability::{init_metrics_recorder, HealthState};
use room_service::routes::{self, AppState};
use room_service::token::{RtcTokenBuilder, TokenIssuer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Room Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        media_credentials = config.has_media_credentials(),
        token_ttl_seconds = config.token_ttl_seconds,
        connection_send_buffer = config.connection_send_buffer,
        ws_ping_interval_seconds = config.ws_ping_interval_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    let token_issuer: Option<Arc<dyn TokenIssuer>> = match RtcTokenBuilder::from_config(&config)
    {
        Some(builder) => Some(Arc::new(builder)),
        None => {
            warn!("APP_ID / APP_CERTIFICATE not set; /getToken will answer 500");
            None
        }
    };

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let coordinator = SessionCoordinatorHandle::spawn();
    let health = Arc::new(HealthState::new());

    let state = Arc::new(AppState {
        config,
        coordinator: coordinator.clone(),
        token_issuer,
        health: Arc::clone(&health),
    });

    let app = routes::build_routes(state, metrics_handle);

    // Bind before reporting ready
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", addr, e);
        e
    })?;
    health.set_ready();

    info!("Room Service listening on {}", addr);

    let server_token = coordinator.child_token();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_token.cancelled().await })
            .await
    });

    shutdown_signal().await;

    // Stop advertising readiness before tearing anything down
    health.set_not_ready();
    coordinator.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task failed: {}", e),
    }

    info!("Room Service shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
