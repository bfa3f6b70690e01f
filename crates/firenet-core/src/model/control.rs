// ── Writable controls ──
//
// Every field a command may target, with its value type and accepted
// range. Commands are validated against this table before anything
// reaches the network.

use std::ops::RangeInclusive;

use serde_json::Value;

use crate::error::CoreError;

/// Value type of a writable control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Bool,
    /// Integer within the inclusive range.
    Int(RangeInclusive<i64>),
    /// Integer within the inclusive range, sent as a decimal string.
    Temperature(RangeInclusive<i64>),
}

/// One row of the writable-control table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSpec {
    pub field: &'static str,
    pub kind: ControlKind,
}

const fn boolean(field: &'static str) -> ControlSpec {
    ControlSpec {
        field,
        kind: ControlKind::Bool,
    }
}

const fn int(field: &'static str, min: i64, max: i64) -> ControlSpec {
    ControlSpec {
        field,
        kind: ControlKind::Int(min..=max),
    }
}

const fn temperature(field: &'static str, min: i64, max: i64) -> ControlSpec {
    ControlSpec {
        field,
        kind: ControlKind::Temperature(min..=max),
    }
}

pub static WRITABLE_CONTROLS: [ControlSpec; 13] = [
    temperature("targetTemperature", 14, 28),
    temperature("setBackTemperature", 12, 20),
    boolean("onOff"),
    int("operatingMode", 0, 2),
    int("heatingPower", 30, 100),
    boolean("heatingTimesActiveForComfort"),
    boolean("convectionFan1Active"),
    int("convectionFan1Level", 0, 5),
    int("convectionFan1Area", -30, 30),
    boolean("convectionFan2Active"),
    int("convectionFan2Level", 0, 5),
    int("convectionFan2Area", -30, 30),
    int("RoomPowerRequest", 1, 4),
];

/// Look up a writable control by its exact payload name.
pub fn control_spec(field: &str) -> Option<&'static ControlSpec> {
    WRITABLE_CONTROLS.iter().find(|spec| spec.field == field)
}

impl ControlSpec {
    /// Check `value` and convert it to the wire representation.
    pub fn encode(&self, value: &Value) -> Result<Value, CoreError> {
        match &self.kind {
            ControlKind::Bool => parse_bool(value).map(Value::Bool).ok_or_else(|| {
                CoreError::validation(format!("{} expects a boolean, got {value}", self.field))
            }),
            ControlKind::Int(range) => {
                let n = self.parse_in_range(value, range)?;
                Ok(Value::from(n))
            }
            ControlKind::Temperature(range) => {
                let n = self.parse_in_range(value, range)?;
                Ok(Value::String(n.to_string()))
            }
        }
    }

    fn parse_in_range(&self, value: &Value, range: &RangeInclusive<i64>) -> Result<i64, CoreError> {
        let n = parse_int(value).ok_or_else(|| {
            CoreError::validation(format!("{} expects an integer, got {value}", self.field))
        })?;
        if !range.contains(&n) {
            return Err(CoreError::validation(format!(
                "{} must be between {} and {}, got {n}",
                self.field,
                range.start(),
                range.end()
            )));
        }
        Ok(n)
    }
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Some(true),
            "false" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_int(value: &Value) -> Option<i64> {
    // Booleans are not integers here, even though the payload reader is lenient.
    if value.is_boolean() {
        return None;
    }
    super::value::as_i64(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_field_is_unique() {
        for (i, spec) in WRITABLE_CONTROLS.iter().enumerate() {
            assert!(
                WRITABLE_CONTROLS[i + 1..]
                    .iter()
                    .all(|other| other.field != spec.field),
                "duplicate {}",
                spec.field
            );
        }
    }

    #[test]
    fn temperatures_are_sent_as_strings() {
        let spec = control_spec("targetTemperature").unwrap();
        assert_eq!(spec.encode(&json!(22)).unwrap(), json!("22"));
        assert_eq!(spec.encode(&json!("23")).unwrap(), json!("23"));
    }

    #[test]
    fn range_is_inclusive() {
        let spec = control_spec("heatingPower").unwrap();
        assert_eq!(spec.encode(&json!(30)).unwrap(), json!(30));
        assert_eq!(spec.encode(&json!(100)).unwrap(), json!(100));
        assert!(spec.encode(&json!(29)).is_err());
        assert!(spec.encode(&json!(101)).is_err());
    }

    #[test]
    fn negative_fan_area() {
        let spec = control_spec("convectionFan2Area").unwrap();
        assert_eq!(spec.encode(&json!(-30)).unwrap(), json!(-30));
        assert!(spec.encode(&json!(-31)).is_err());
    }

    #[test]
    fn fractional_temperature_is_rejected() {
        let spec = control_spec("targetTemperature").unwrap();
        let err = spec.encode(&json!(21.5)).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn boolean_forms() {
        let spec = control_spec("onOff").unwrap();
        assert_eq!(spec.encode(&json!(true)).unwrap(), json!(true));
        assert_eq!(spec.encode(&json!("off")).unwrap(), json!(false));
        assert_eq!(spec.encode(&json!(1)).unwrap(), json!(true));
        assert!(spec.encode(&json!(2)).is_err());
        assert!(spec.encode(&json!("maybe")).is_err());
    }

    #[test]
    fn boolean_is_not_an_integer() {
        let spec = control_spec("operatingMode").unwrap();
        assert!(spec.encode(&json!(true)).is_err());
    }

    #[test]
    fn unknown_field_has_no_spec() {
        assert!(control_spec("statusMainState").is_none());
        assert!(control_spec("ontime").is_none());
    }
}
