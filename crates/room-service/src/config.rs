//! Room Service configuration.
//!
//! Configuration is loaded from environment variables. Media transport
//! credentials are optional at startup: when they are absent the service
//! still coordinates rooms, and the token endpoint answers with a server
//! error. Sensitive fields are redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default access token validity window in seconds.
pub const DEFAULT_TOKEN_TTL_SECONDS: u32 = 3600;

/// Default per-connection outbound queue size.
pub const DEFAULT_CONNECTION_SEND_BUFFER: usize = 256;

/// Default WebSocket keepalive ping interval in seconds.
pub const DEFAULT_WS_PING_INTERVAL_SECONDS: u64 = 30;

/// Room Service configuration.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP/WebSocket server binds to (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// Media transport application ID (`APP_ID`).
    pub app_id: Option<SecretString>,

    /// Media transport application certificate (`APP_CERTIFICATE`).
    /// Used as the HMAC key when signing access tokens.
    pub app_certificate: Option<SecretString>,

    /// How long issued access tokens stay valid, in seconds.
    pub token_ttl_seconds: u32,

    /// Capacity of each connection's outbound event queue.
    pub connection_send_buffer: usize,

    /// Interval between WebSocket keepalive pings, in seconds.
    pub ws_ping_interval_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("app_id", &self.app_id.as_ref().map(|_| "[REDACTED]"))
            .field(
                "app_certificate",
                &self.app_certificate.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("connection_send_buffer", &self.connection_send_buffer)
            .field("ws_ping_interval_seconds", &self.ws_ping_interval_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match vars.get("BIND_ADDRESS") {
            Some(addr) => addr.clone(),
            None => {
                let port = parse_or(vars, "PORT", DEFAULT_PORT)?;
                format!("0.0.0.0:{port}")
            }
        };

        let app_id = non_empty_secret(vars, "APP_ID");
        let app_certificate = non_empty_secret(vars, "APP_CERTIFICATE");

        let token_ttl_seconds = parse_or(vars, "TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;
        if token_ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECONDS must be greater than zero".to_string(),
            ));
        }

        let connection_send_buffer = parse_or(
            vars,
            "CONNECTION_SEND_BUFFER",
            DEFAULT_CONNECTION_SEND_BUFFER,
        )?;
        if connection_send_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "CONNECTION_SEND_BUFFER must be greater than zero".to_string(),
            ));
        }

        let ws_ping_interval_seconds = parse_or(
            vars,
            "WS_PING_INTERVAL_SECONDS",
            DEFAULT_WS_PING_INTERVAL_SECONDS,
        )?;
        if ws_ping_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "WS_PING_INTERVAL_SECONDS must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            bind_address,
            app_id,
            app_certificate,
            token_ttl_seconds,
            connection_send_buffer,
            ws_ping_interval_seconds,
        })
    }

    /// Whether both media transport secrets are present.
    #[must_use]
    pub fn has_media_credentials(&self) -> bool {
        self.credentials().is_some()
    }

    /// Returns `(app_id, app_certificate)` when both are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&SecretString, &SecretString)> {
        self.app_id.as_ref().zip(self.app_certificate.as_ref())
    }
}

fn non_empty_secret(vars: &HashMap<String, String>, key: &str) -> Option<SecretString> {
    vars.get(key)
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretString::from(value.clone()))
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{key} is not a valid number"))),
        None => Ok(default),
    }
}
