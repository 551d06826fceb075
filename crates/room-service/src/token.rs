//! Media transport access tokens (AccessToken v006).
//!
//! Token layout:
//!
//! ```text
//! token     = "006" || app_id || base64(content)
//! content   = u16 len || signature || crc32(channel) u32 || crc32(uid) u32 || u16 len || message
//! message   = salt u32 || expire_ts u32 || u16 count || (privilege u16, expire u32)*
//! signature = HMAC-SHA256(app_certificate, app_id || channel || uid || message)
//! ```
//!
//! All integers are little-endian and privileges are sorted by key. The uid
//! is signed as the account string the client supplied, or the empty string
//! when it supplied none.
//!
//! Issuance is stateless and runs on the HTTP handler, never inside the
//! session coordinator.

use crate::config::Config;
use crate::errors::TokenError;
use base64::{engine::general_purpose::STANDARD, Engine};
use common::secret::{ExposeSecret, SecretString};
use ring::{hmac, rand};
use std::collections::BTreeMap;

/// Token format version prefix.
pub const VERSION: &str = "006";

/// Lifetime of the token envelope itself, independent of privilege expiry.
pub const TOKEN_ENVELOPE_SECONDS: u32 = 24 * 3600;

/// Salts are drawn from `1..=MAX_SALT`.
const MAX_SALT: u32 = 99_999_999;

/// Privileges understood by the media transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
}

/// Privileges granted to a publisher.
pub const PUBLISHER_PRIVILEGES: [Privilege; 4] = [
    Privilege::JoinChannel,
    Privilege::PublishAudioStream,
    Privilege::PublishVideoStream,
    Privilege::PublishDataStream,
];

/// A token ready to be signed.
#[derive(Debug, Clone)]
pub struct AccessToken<'a> {
    app_id: &'a str,
    app_certificate: &'a str,
    channel_name: &'a str,
    uid: String,
    salt: u32,
    expire_ts: u32,
    privileges: BTreeMap<u16, u32>,
}

impl<'a> AccessToken<'a> {
    /// `uid` is the account string: empty for the wildcard uid.
    #[must_use]
    pub fn new(
        app_id: &'a str,
        app_certificate: &'a str,
        channel_name: &'a str,
        uid: impl Into<String>,
        salt: u32,
        expire_ts: u32,
    ) -> Self {
        Self {
            app_id,
            app_certificate,
            channel_name,
            uid: uid.into(),
            salt,
            expire_ts,
            privileges: BTreeMap::new(),
        }
    }

    /// Grant `privilege` until the unix timestamp `expires_at`.
    pub fn add_privilege(&mut self, privilege: Privilege, expires_at: u32) {
        self.privileges.insert(privilege as u16, expires_at);
    }

    /// Sign and encode the token.
    pub fn build(&self) -> Result<String, TokenError> {
        let message = self.pack_message()?;

        let key = hmac::Key::new(hmac::HMAC_SHA256, self.app_certificate.as_bytes());
        let mut signing_ctx = hmac::Context::with_key(&key);
        signing_ctx.update(self.app_id.as_bytes());
        signing_ctx.update(self.channel_name.as_bytes());
        signing_ctx.update(self.uid.as_bytes());
        signing_ctx.update(&message);
        let signature = signing_ctx.sign();

        let mut content = Vec::with_capacity(2 + 32 + 8 + 2 + message.len());
        put_bytes(&mut content, signature.as_ref())?;
        content.extend_from_slice(&crc32fast::hash(self.channel_name.as_bytes()).to_le_bytes());
        content.extend_from_slice(&crc32fast::hash(self.uid.as_bytes()).to_le_bytes());
        put_bytes(&mut content, &message)?;

        Ok(format!("{VERSION}{}{}", self.app_id, STANDARD.encode(content)))
    }

    fn pack_message(&self) -> Result<Vec<u8>, TokenError> {
        let count = u16::try_from(self.privileges.len())
            .map_err(|_| TokenError::Build("too many privileges".to_string()))?;

        let mut message = Vec::with_capacity(10 + self.privileges.len() * 6);
        message.extend_from_slice(&self.salt.to_le_bytes());
        message.extend_from_slice(&self.expire_ts.to_le_bytes());
        message.extend_from_slice(&count.to_le_bytes());
        for (key, value) in &self.privileges {
            message.extend_from_slice(&key.to_le_bytes());
            message.extend_from_slice(&value.to_le_bytes());
        }
        Ok(message)
    }
}

/// u16 length prefix followed by the bytes.
fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), TokenError> {
    let len = u16::try_from(bytes.len())
        .map_err(|_| TokenError::Build(format!("field of {} bytes too long", bytes.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// The account string signed for a `uid` query value: the trimmed value
/// verbatim, or empty when absent or blank.
#[must_use]
pub fn uid_account(uid: Option<&str>) -> &str {
    uid.map(str::trim).unwrap_or_default()
}

/// A freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// Unix timestamp at which the granted privileges lapse.
    pub privilege_expires_at: u32,
}

/// Issues access tokens for a channel and uid account string.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, channel_name: &str, account: &str) -> Result<IssuedToken, TokenError>;
}

/// Publisher token builder backed by the configured app credentials.
pub struct RtcTokenBuilder {
    app_id: SecretString,
    app_certificate: SecretString,
    ttl_seconds: u32,
    rng: rand::SystemRandom,
}

impl RtcTokenBuilder {
    #[must_use]
    pub fn new(app_id: SecretString, app_certificate: SecretString, ttl_seconds: u32) -> Self {
        Self {
            app_id,
            app_certificate,
            ttl_seconds,
            rng: rand::SystemRandom::new(),
        }
    }

    /// Builder from configuration, or `None` when either credential is
    /// missing.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let (app_id, app_certificate) = config.credentials()?;
        Some(Self::new(
            app_id.clone(),
            app_certificate.clone(),
            config.token_ttl_seconds,
        ))
    }

    /// Deterministic publisher token issued at `issued_at` (unix seconds).
    pub fn build_token_with_account(
        &self,
        channel_name: &str,
        account: &str,
        issued_at: u32,
        salt: u32,
    ) -> Result<IssuedToken, TokenError> {
        let privilege_expires_at = issued_at
            .checked_add(self.ttl_seconds)
            .ok_or_else(|| TokenError::Build("privilege expiry overflows".to_string()))?;
        let expire_ts = issued_at
            .checked_add(TOKEN_ENVELOPE_SECONDS)
            .ok_or_else(|| TokenError::Build("token expiry overflows".to_string()))?;

        let mut token = AccessToken::new(
            self.app_id.expose_secret(),
            self.app_certificate.expose_secret(),
            channel_name,
            account,
            salt,
            expire_ts,
        );
        for privilege in PUBLISHER_PRIVILEGES {
            token.add_privilege(privilege, privilege_expires_at);
        }

        Ok(IssuedToken {
            token: token.build()?,
            privilege_expires_at,
        })
    }

    fn random_salt(&self) -> Result<u32, TokenError> {
        let mut bytes = [0u8; 4];
        rand::SecureRandom::fill(&self.rng, &mut bytes)
            .map_err(|_| TokenError::Build("CSPRNG fill failed".to_string()))?;
        Ok(u32::from_le_bytes(bytes) % MAX_SALT + 1)
    }
}

impl TokenIssuer for RtcTokenBuilder {
    fn issue(&self, channel_name: &str, account: &str) -> Result<IssuedToken, TokenError> {
        if channel_name.is_empty() {
            return Err(TokenError::MissingChannelName);
        }

        let issued_at = u32::try_from(chrono::Utc::now().timestamp())
            .map_err(|_| TokenError::Build("clock outside token timestamp range".to_string()))?;
        let salt = self.random_salt()?;

        self.build_token_with_account(channel_name, account, issued_at, salt)
    }
}
