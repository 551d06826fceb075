//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for media transport credentials.
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that holds one (for example the service `Config`) is safe to log.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct MediaCredentials {
//!     app_id: SecretString,
//!     app_certificate: SecretString,
//! }
//!
//! let creds = MediaCredentials {
//!     app_id: SecretString::from("970ca35de60c44645bbae8a215061b33"),
//!     app_certificate: SecretString::from("5cfd2fd1755d40ecb72977518be15d3b"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("5cfd2fd1"));
//! assert_eq!(creds.app_id.expose_secret().len(), 32);
//! ```
//!
//! Secrets are zeroized on drop.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("app-certificate");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("app-certificate"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("970ca35de60c");
        assert_eq!(secret.expose_secret(), "970ca35de60c");
    }

    #[test]
    fn test_deserialize() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct Credentials {
            app_id: String,
            app_certificate: SecretString,
        }

        let json = r#"{"app_id": "app", "app_certificate": "cert-value"}"#;
        let creds: Credentials = serde_json::from_str(json).expect("deserialize");

        assert_eq!(creds.app_certificate.expose_secret(), "cert-value");

        let debug = format!("{creds:?}");
        assert!(!debug.contains("cert-value"));
        assert!(debug.contains("REDACTED"));
    }
}
