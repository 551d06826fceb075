//! Access token endpoint.
//!
//! `GET /getToken?channelName=<name>&uid=<account>`
//!
//! Returns `{"token": "..."}`. `uid` is optional and signed verbatim after
//! trimming; absent or blank signs the wildcard (empty) account.

use crate::errors::TokenError;
use crate::observability::metrics;
use crate::routes::AppState;
use crate::token::uid_account;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Query parameters. Both are taken as raw strings so that a missing
/// channel produces this endpoint's own error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    pub channel_name: Option<String>,
    pub uid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[instrument(skip_all, name = "room.token.issue")]
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, TokenError> {
    let result = issue(&state, &query);

    match &result {
        Ok(_) => metrics::record_token_issued("success"),
        Err(e) => metrics::record_token_issued(e.metric_label()),
    }

    result.map(|token| Json(TokenResponse { token }))
}

fn issue(state: &AppState, query: &TokenQuery) -> Result<String, TokenError> {
    let channel_name = query
        .channel_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(TokenError::MissingChannelName)?;
    let account = uid_account(query.uid.as_deref());

    let Some(issuer) = state.token_issuer.as_ref() else {
        error!(
            target: "room.token",
            "Token requested but APP_ID / APP_CERTIFICATE are not configured"
        );
        return Err(TokenError::NotConfigured);
    };

    match issuer.issue(channel_name, account) {
        Ok(issued) => {
            info!(
                target: "room.token",
                channel = %channel_name,
                uid = %account,
                privilege_expires_at = issued.privilege_expires_at,
                "Access token issued"
            );
            Ok(issued.token)
        }
        Err(e) => {
            error!(target: "room.token", error = %e, "Access token construction failed");
            Err(e)
        }
    }
}
