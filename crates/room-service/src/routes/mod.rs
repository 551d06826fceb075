//! HTTP routes for the Room Service.
//!
//! Defines the Axum router and application state.

use crate::actors::SessionCoordinatorHandle;
use crate::config::Config;
use crate::handlers;
use crate::observability::{health_router, HealthState};
use crate::token::TokenIssuer;
use axum::{http::Method, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    /// Handle to the single session coordinator.
    pub coordinator: SessionCoordinatorHandle,

    /// `None` when media transport credentials are not configured; the token
    /// endpoint then answers 500.
    pub token_issuer: Option<Arc<dyn TokenIssuer>>,

    pub health: Arc<HealthState>,
}

/// Build the application routes.
///
/// - `/getToken` - Media transport access token
/// - `/ws` - Room session WebSocket
/// - `/health`, `/ready` - Probes
/// - `/metrics` - Prometheus scrape endpoint
///
/// Every route allows any CORS origin, is traced, and times out after 30
/// seconds (the WebSocket upgrade response included; the upgraded session
/// is not subject to it).
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let app_routes = Router::new()
        .route("/getToken", get(handlers::get_token))
        .route("/ws", get(handlers::ws_handler))
        .with_state(Arc::clone(&state));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    app_routes
        .merge(metrics_routes)
        .merge(health_router(Arc::clone(&state.health)))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
}
