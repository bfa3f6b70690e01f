use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `firenet-api` crate.
///
/// Covers every failure mode of the cloud service: login, session
/// lifetime, transport, discovery, and payload decoding.
/// `firenet-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or the session was rejected again after a fresh login.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session cookie missing, expired, or revoked. Callers may log in again.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// Service unreachable: DNS failure, refused connection, reset.
    #[error("Connection to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within the configured timeout.
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client could not be constructed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Service ─────────────────────────────────────────────────────
    /// Listing page was served but no stove could be extracted from it.
    #[error("No stoves found: {message}")]
    Discovery { message: String },

    /// Non-success HTTP status outside the session-expiry cases.
    #[error("Firenet API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Classify a `reqwest` failure.
    ///
    /// Timeouts are kept apart from every other transport failure so a slow
    /// service never looks like an unreachable one.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout { timeout };
        }
        Self::Connection {
            url: err
                .url()
                .map_or_else(|| "<unknown>".into(), ToString::to_string),
            source: err,
        }
    }

    /// Returns `true` if this error indicates the session has expired
    /// and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
