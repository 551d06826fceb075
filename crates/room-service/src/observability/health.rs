//! Liveness and readiness probes.
//!
//! - `GET /health` answers 200 `OK` whenever the process can answer at all.
//! - `GET /ready` reports the serving phase: 200 `serving` once the listener
//!   is bound, 503 `starting` before that and 503 `draining` after shutdown
//!   begins. Draining is final.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Serving phase of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Starting = 0,
    Serving = 1,
    Draining = 2,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Starting,
            1 => Phase::Serving,
            _ => Phase::Draining,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::Serving => "serving",
            Phase::Draining => "draining",
        }
    }
}

/// Shared probe state, advanced by `main` during startup and shutdown.
#[derive(Debug, Default)]
pub struct HealthState {
    phase: AtomicU8,
}

impl HealthState {
    /// Starts in [`Phase::Starting`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter [`Phase::Serving`]. Ignored once draining.
    pub fn set_ready(&self) {
        let _ = self.phase.compare_exchange(
            Phase::Starting as u8,
            Phase::Serving as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Enter [`Phase::Draining`].
    pub fn set_not_ready(&self) {
        self.phase.store(Phase::Draining as u8, Ordering::Release);
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Serving
    }
}

/// Router serving `/health` and `/ready`.
pub fn health_router(health_state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ready", get(readiness_handler))
        .with_state(health_state)
}

async fn readiness_handler(State(state): State<Arc<HealthState>>) -> (StatusCode, &'static str) {
    let phase = state.phase();
    let status = if phase == Phase::Serving {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, phase.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    async fn probe(state: &Arc<HealthState>, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = health_router(Arc::clone(state))
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_phase_transitions() {
        let state = HealthState::new();
        assert_eq!(state.phase(), Phase::Starting);
        assert!(!state.is_ready());

        state.set_ready();
        assert_eq!(state.phase(), Phase::Serving);
        assert!(state.is_ready());

        state.set_not_ready();
        assert_eq!(state.phase(), Phase::Draining);
        assert!(!state.is_ready());
    }

    #[test]
    fn test_draining_is_final() {
        let state = HealthState::new();
        state.set_not_ready();
        state.set_ready();

        assert_eq!(state.phase(), Phase::Draining);
    }

    #[tokio::test]
    async fn test_liveness_ok_in_every_phase() {
        let state = Arc::new(HealthState::new());
        assert_eq!(probe(&state, "/health").await, (StatusCode::OK, "OK".to_string()));

        state.set_not_ready();
        assert_eq!(probe(&state, "/health").await, (StatusCode::OK, "OK".to_string()));
    }

    #[tokio::test]
    async fn test_readiness_reports_phase() {
        let state = Arc::new(HealthState::new());
        assert_eq!(
            probe(&state, "/ready").await,
            (StatusCode::SERVICE_UNAVAILABLE, "starting".to_string())
        );

        state.set_ready();
        assert_eq!(
            probe(&state, "/ready").await,
            (StatusCode::OK, "serving".to_string())
        );

        state.set_not_ready();
        assert_eq!(
            probe(&state, "/ready").await,
            (StatusCode::SERVICE_UNAVAILABLE, "draining".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let state = Arc::new(HealthState::new());
        assert_eq!(probe(&state, "/healthz").await.0, StatusCode::NOT_FOUND);
    }
}
