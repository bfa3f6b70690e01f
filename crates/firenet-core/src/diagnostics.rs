// ── Diagnostics ──
//
// Serializable dump of coordinator and stove state for bug reports.
// Account identifiers and stove ids are redacted at any depth.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Platform;

/// Replacement text for redacted values.
pub const REDACTED: &str = "**REDACTED**";

/// Keys whose values never leave the process.
pub const TO_REDACT: [&str; 6] = ["username", "password", "email", "stoveID", "stoveId", "id"];

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub account: AccountDiagnostics,
    pub coordinator: CoordinatorDiagnostics,
    pub stoves: Vec<StoveDiagnostics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountDiagnostics {
    pub username: String,
    pub base_url: String,
    pub default_temperature: f64,
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorDiagnostics {
    pub state: String,
    pub last_update_success: bool,
    /// ISO-8601, `None` until the first successful tick.
    pub last_update_time: Option<String>,
    pub last_error: Option<String>,
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoveDiagnostics {
    pub name: String,
    pub state: Option<Value>,
}

/// Copy of `value` with every [`TO_REDACT`] key masked, recursively.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let v = if TO_REDACT.contains(&key.as_str()) {
                        Value::String(REDACTED.into())
                    } else {
                        redact(v)
                    };
                    (key.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
