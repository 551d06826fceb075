//! WebSocket upgrade for room sessions.

use crate::connection::{run_session, SessionSettings};
use crate::routes::AppState;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use std::sync::Arc;

/// Upgrade `GET /ws` and hand the socket to a session task.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let coordinator = state.coordinator.clone();
    let settings = SessionSettings::from_config(&state.config);
    let cancel_token = coordinator.child_token();

    ws.on_upgrade(move |socket| run_session(socket, coordinator, settings, cancel_token))
}
