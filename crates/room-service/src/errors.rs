//! Room Service error types.
//!
//! `RoomError` covers the coordinator and transport plumbing. Room-level
//! failures (unknown room, non-host authority) are deliberately not errors:
//! the coordinator drops them without telling the caller.
//!
//! `TokenError` covers the credential endpoint and maps to HTTP responses.
//! Internal details are logged server-side but not exposed to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Coordinator and transport error type.
#[derive(Debug, Error)]
pub enum RoomError {
    /// Coordinator mailbox or response channel failed.
    #[error("Internal error: {0}")]
    Internal(String),

    /// WebSocket send/receive failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Access token issuance errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// `channelName` query parameter absent or empty.
    #[error("channelName is required")]
    MissingChannelName,

    /// `APP_ID` / `APP_CERTIFICATE` not configured.
    #[error("Media transport credentials are not configured")]
    NotConfigured,

    /// Token construction failed.
    #[error("Token construction failed: {0}")]
    Build(String),
}

impl TokenError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::MissingChannelName => StatusCode::BAD_REQUEST,
            TokenError::NotConfigured | TokenError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            TokenError::MissingChannelName => self.to_string(),
            TokenError::NotConfigured | TokenError::Build(_) => {
                "Failed to generate token".to_string()
            }
        }
    }

    /// Bounded label for metrics.
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            TokenError::MissingChannelName => "missing_channel",
            TokenError::NotConfigured => "not_configured",
            TokenError::Build(_) => "build_failed",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}
