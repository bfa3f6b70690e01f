// ── Loose JSON coercions ──
//
// The stove payload mixes numbers, numeric strings, and booleans for the
// same kind of field depending on firmware. These helpers are the only
// place that knows how to read them.

use serde_json::Value;

/// A finite number, or a string that parses as one.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// An integral number, or a string holding one. `4.0` counts, `4.5` does not.
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract().abs() < f64::EPSILON)
                .and_then(integral_f64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// `true`, a non-zero number, or the strings `"true"` / `"1"`.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        _ => false,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn integral_f64(f: f64) -> Option<i64> {
    // i64::MIN/MAX are not exactly representable; stay well inside.
    (f.abs() < 9.0e15).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_and_numeric_strings_parse() {
        assert_eq!(as_f64(&json!(85.5)), Some(85.5));
        assert_eq!(as_f64(&json!("22")), Some(22.0));
        assert_eq!(as_f64(&json!(" 18.5 ")), Some(18.5));
        assert_eq!(as_f64(&json!("warm")), None);
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_f64(&json!(true)), None);
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(as_i64(&json!(4)), Some(4));
        assert_eq!(as_i64(&json!(4.0)), Some(4));
        assert_eq!(as_i64(&json!("2")), Some(2));
        assert_eq!(as_i64(&json!(4.5)), None);
        assert_eq!(as_i64(&json!("4.5")), None);
        assert_eq!(as_i64(&json!([4])), None);
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!(2.5)));
        assert!(is_truthy(&json!("true")));
        assert!(is_truthy(&json!("1")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!(null)));
    }
}
