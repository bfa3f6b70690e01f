//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use firenet_config::ConfigError;
use firenet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to Firenet at {url}")]
    #[diagnostic(
        code(firenet::connection_failed),
        help(
            "Check your network connection and that the service is reachable.\n\
             URL: {url}\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout:?}")]
    #[diagnostic(
        code(firenet::timeout),
        help("Increase timeout with --timeout or try again later.")
    )]
    Timeout { timeout: Duration },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(firenet::auth_failed),
        help(
            "Verify your Firenet e-mail and password.\n\
             Run: firenet config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(firenet::no_credentials),
        help(
            "Configure credentials with: firenet config init\n\
             Or set FIRENET_USERNAME and FIRENET_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Stove '{identifier}' not found")]
    #[diagnostic(
        code(firenet::not_found),
        help("Run: firenet stoves to see available stoves")
    )]
    StoveNotFound { identifier: String },

    #[error("No stoves found on this account")]
    #[diagnostic(
        code(firenet::no_stoves),
        help("Register your stove in the Firenet web app first.\n{message}")
    )]
    NoStoves { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(
        code(firenet::api_error),
        help("The Firenet service rejected the request. Retry later if it is under maintenance.")
    )]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(firenet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(firenet::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: firenet config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(firenet::config))]
    Config { message: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(firenet::keyring),
        help("Set FIRENET_PASSWORD instead if no system keyring is available.")
    )]
    Keyring { message: String },

    // ── Internal ─────────────────────────────────────────────────────

    #[error("Internal error: {message}")]
    #[diagnostic(code(firenet::internal))]
    Internal { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::StoveNotFound { .. } | Self::NoStoves { .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => CliError::AuthFailed { message },
            CoreError::Connection { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout } => CliError::Timeout { timeout },
            CoreError::Discovery { message } => CliError::NoStoves { message },
            CoreError::StoveNotFound { identifier } => CliError::StoveNotFound { identifier },
            CoreError::Validation { message } => CliError::Validation {
                field: "value".into(),
                reason: message,
            },
            CoreError::Api { message, .. } => CliError::ApiError { message },
            CoreError::Config { message } => CliError::Config { message },
            CoreError::NotConfigured => CliError::Internal {
                message: "coordinator is not set up".into(),
            },
            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Keyring(message) => CliError::Keyring { message },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
