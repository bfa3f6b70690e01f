// ── Runtime account configuration ──
//
// Describes *how* to reach one Firenet account. Carries credentials and
// polling tuning but never touches disk; the CLI builds a
// `CoordinatorConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use url::Url;

/// Target temperature assumed when a stove reports none.
pub const DEFAULT_TEMPERATURE: f64 = 21.0;

/// Default polling period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Host platforms an account's stoves are exposed on. Passed through
/// untouched; the coordinator itself does not act on them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Climate,
    Sensor,
    Switch,
    Number,
    BinarySensor,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Climate,
        Platform::Sensor,
        Platform::Switch,
        Platform::Number,
        Platform::BinarySensor,
    ];
}

/// Configuration for one Firenet account.
///
/// Built by the CLI, passed to `Coordinator` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Service base URL (production unless overridden for testing).
    pub base_url: Url,
    /// Account e-mail.
    pub username: String,
    pub password: SecretString,
    /// Fallback target temperature.
    pub default_temperature: f64,
    /// Enabled host platforms.
    pub platforms: Vec<Platform>,
    /// Polling period. `Duration::ZERO` disables the background task.
    pub refresh_interval: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl CoordinatorConfig {
    /// Account configuration with production endpoint and default tuning.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: Url::parse(firenet_api::DEFAULT_BASE_URL).expect("valid default base URL"),
            username: username.into(),
            password,
            default_temperature: DEFAULT_TEMPERATURE,
            platforms: Platform::ALL.to_vec(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
