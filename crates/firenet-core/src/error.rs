// ── Core error types ──
//
// User-facing errors from firenet-core. Consumers never see raw HTTP
// failures or cookie details; the `From<firenet_api::Error>` impl
// translates transport-layer errors into domain variants.

use std::time::Duration;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Cannot connect to Firenet at {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Firenet request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("No stoves found: {message}")]
    Discovery { message: String },

    #[error("Stove not found: {identifier}")]
    StoveNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Coordinator is not set up")]
    NotConfigured,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<firenet_api::Error> for CoreError {
    fn from(err: firenet_api::Error) -> Self {
        match err {
            firenet_api::Error::Authentication { message } => CoreError::Authentication { message },
            firenet_api::Error::SessionExpired => CoreError::Authentication {
                message: "Session expired -- re-authentication required".into(),
            },
            firenet_api::Error::Connection { url, source } => CoreError::Connection {
                url,
                reason: source.to_string(),
            },
            firenet_api::Error::Timeout { timeout } => CoreError::Timeout { timeout },
            firenet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            firenet_api::Error::Tls(msg) => CoreError::Connection {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            firenet_api::Error::Discovery { message } => CoreError::Discovery { message },
            firenet_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            firenet_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_maps_to_authentication() {
        let err = CoreError::from(firenet_api::Error::SessionExpired);
        assert!(matches!(err, CoreError::Authentication { .. }));
    }

    #[test]
    fn timeout_keeps_its_duration() {
        let timeout = Duration::from_secs(30);
        let err = CoreError::from(firenet_api::Error::Timeout { timeout });
        assert!(matches!(err, CoreError::Timeout { timeout: t } if t == timeout));
        assert_eq!(err.to_string(), "Firenet request timed out after 30s");
    }

    #[test]
    fn sub_second_timeout_is_not_reported_as_zero() {
        let err = CoreError::from(firenet_api::Error::Timeout {
            timeout: Duration::from_millis(250),
        });
        let message = err.to_string();
        assert!(message.ends_with("250ms"), "{message}");
        assert!(!message.contains(" 0s"), "{message}");
    }

    #[test]
    fn discovery_stays_a_discovery_error() {
        let err = CoreError::from(firenet_api::Error::Discovery {
            message: "empty".into(),
        });
        assert!(matches!(err, CoreError::Discovery { .. }));
    }
}
