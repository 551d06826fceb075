//! Metric definitions for the Room Service.
//!
//! All metrics use the `room_` prefix and Prometheus naming conventions
//! (`_total` suffix for counters).

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return the handle used to render
/// `/metrics`.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Metric: `room_rooms_active`
pub fn set_rooms_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("room_rooms_active").set(count as f64);
}

/// Metric: `room_connections_active`
pub fn set_connections_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("room_connections_active").set(count as f64);
}

/// Count one processed inbound event.
///
/// Metric: `room_events_total`
/// Labels: `event` (join-room, chat-message, kick-user, end-meeting)
pub fn record_event(event: &'static str) {
    counter!("room_events_total", "event" => event).increment(1);
}

/// Count a host-only action attempted by a non-host.
///
/// Metric: `room_authority_denied_total`
/// Labels: `event` (kick-user, end-meeting)
pub fn record_authority_denied(event: &'static str) {
    counter!("room_authority_denied_total", "event" => event).increment(1);
}

/// Metric: `room_broadcast_dropped_total`
pub fn record_broadcast_dropped() {
    counter!("room_broadcast_dropped_total").increment(1);
}

/// Count one access token request by outcome.
///
/// Metric: `room_tokens_issued_total`
/// Labels: `status` (success, missing_channel, not_configured, build_failed)
pub fn record_token_issued(status: &'static str) {
    counter!("room_tokens_issued_total", "status" => status).increment(1);
}
