// Wire types for the Firenet service.
//
// The state document is vendor-defined and changes across firmware
// versions, so it is kept as loosely-typed JSON maps. Interpretation
// happens in `firenet-core`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One stove as advertised on the summary page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoveDescriptor {
    /// Service-assigned identifier; some pages emit it as a number.
    #[serde(rename = "stoveId", deserialize_with = "string_or_number")]
    pub stove_id: String,
    #[serde(default)]
    pub name: String,
}

/// Raw per-stove state document: `sensors` (read-only telemetry) and
/// `controls` (read/write settings). Any other top-level keys are kept
/// verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StovePayload {
    #[serde(default)]
    pub sensors: Map<String, Value>,
    #[serde(default)]
    pub controls: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StovePayload {
    pub fn sensor(&self, key: &str) -> Option<&Value> {
        self.sensors.get(key)
    }

    pub fn control(&self, key: &str) -> Option<&Value> {
        self.controls.get(key)
    }

    /// The whole document as a single JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A single control update: `{"field": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlUpdate {
    pub field: String,
    pub value: Value,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for stoveId, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_keeps_unknown_top_level_keys() {
        let payload: StovePayload = serde_json::from_value(json!({
            "name": "Living room",
            "sensors": { "statusMainState": 4 },
            "controls": { "onOff": true },
            "lastSeenMinutes": 1
        }))
        .unwrap();

        assert_eq!(payload.sensor("statusMainState"), Some(&json!(4)));
        assert_eq!(payload.control("onOff"), Some(&json!(true)));
        assert_eq!(payload.extra.get("lastSeenMinutes"), Some(&json!(1)));
        assert_eq!(payload.to_value()["name"], json!("Living room"));
    }

    #[test]
    fn payload_tolerates_missing_namespaces() {
        let payload: StovePayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.sensors.is_empty());
        assert!(payload.controls.is_empty());
    }

    #[test]
    fn descriptor_accepts_numeric_id() {
        let d: StoveDescriptor =
            serde_json::from_value(json!({ "stoveId": 12345, "name": "Hall" })).unwrap();
        assert_eq!(d.stove_id, "12345");
    }
}
