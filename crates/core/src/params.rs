//! Helpers for reading and writing engine parameters as `serde_json::Value`.
//!
//! The `param_*` readers are lenient: a missing key or a value of the wrong
//! type yields the supplied default. They are used when building an engine
//! from a JSON params object.
//!
//! The `expect_*` readers back `Engine::set_param`. They are strict, because a
//! rejected write must leave engine state untouched and tell the caller why.

use crate::error::EngineError;
use serde_json::Value;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
///
/// Accepts both JSON numbers (including integers) and converts them to f64.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing or wrong type.
///
/// Only succeeds if the JSON value is a non-negative integer that fits in `u64`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Extracts a `bool` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}

/// Extracts a `String` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}

/// Parses free-form numeric text typed by a user.
///
/// Surrounding whitespace is ignored. Non-numeric text, and text that parses
/// to NaN or infinity, is rejected with `EngineError::InvalidInput` naming the
/// parameter so a front end can show a transient message.
pub fn parse_numeric_input(name: &str, text: &str) -> Result<f64, EngineError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(EngineError::InvalidInput(format!(
            "'{trimmed}' is not a valid number for {name}"
        ))),
    }
}

/// Reads a number for `name`, clamped to `[min, max]`.
///
/// JSON numbers are used directly; JSON strings go through
/// [`parse_numeric_input`]. Anything else is a `ParamTypeMismatch`.
pub fn expect_f64(name: &str, value: &Value, min: f64, max: f64) -> Result<f64, EngineError> {
    let raw = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| mismatch(name, "number", value))?,
        Value::String(s) => parse_numeric_input(name, s)?,
        _ => return Err(mismatch(name, "number", value)),
    };
    Ok(raw.clamp(min, max))
}

/// Reads a non-negative integer for `name`, clamped to `[min, max]`.
pub fn expect_usize(name: &str, value: &Value, min: usize, max: usize) -> Result<usize, EngineError> {
    value
        .as_u64()
        .map(|v| (v as usize).clamp(min, max))
        .ok_or_else(|| mismatch(name, "non-negative integer", value))
}

/// Reads a boolean for `name`.
pub fn expect_bool(name: &str, value: &Value) -> Result<bool, EngineError> {
    value
        .as_bool()
        .ok_or_else(|| mismatch(name, "boolean", value))
}

/// Reads a string for `name`.
pub fn expect_str<'a>(name: &str, value: &'a Value) -> Result<&'a str, EngineError> {
    value.as_str().ok_or_else(|| mismatch(name, "string", value))
}

/// Short JSON type name used in mismatch messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(name: &str, expected: &str, got: &Value) -> EngineError {
    EngineError::ParamTypeMismatch {
        name: name.to_owned(),
        expected: expected.to_owned(),
        got: json_type_name(got).to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- param_f64 --

    #[test]
    fn param_f64_extracts_existing_float() {
        let params = json!({"gravity": 2.5});
        assert!((param_f64(&params, "gravity", 1.0) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_extracts_integer_as_float() {
        let params = json!({"length1": 120});
        assert!((param_f64(&params, "length1", 0.0) - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_when_key_missing() {
        let params = json!({"other": 1.0});
        assert!((param_f64(&params, "gravity", 3.0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_when_wrong_type() {
        let params = json!({"gravity": "strong"});
        assert!((param_f64(&params, "gravity", 1.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn param_f64_returns_default_for_non_object() {
        let params = json!("not an object");
        assert!((param_f64(&params, "gravity", 7.0) - 7.0).abs() < f64::EPSILON);
    }

    // -- param_usize / param_bool / param_string --

    #[test]
    fn param_usize_extracts_existing_integer() {
        let params = json!({"substeps": 6});
        assert_eq!(param_usize(&params, "substeps", 1), 6);
    }

    #[test]
    fn param_usize_returns_default_for_float_or_negative() {
        assert_eq!(param_usize(&json!({"substeps": 2.5}), "substeps", 9), 9);
        assert_eq!(param_usize(&json!({"substeps": -1}), "substeps", 5), 5);
    }

    #[test]
    fn param_bool_extracts_and_defaults() {
        assert!(param_bool(&json!({"orbital_mode": true}), "orbital_mode", false));
        assert!(param_bool(&json!({}), "orbital_mode", true));
        assert!(!param_bool(&json!({"orbital_mode": 1}), "orbital_mode", false));
    }

    #[test]
    fn param_string_extracts_and_defaults() {
        assert_eq!(param_string(&json!({"fluid": "water"}), "fluid", "air"), "water");
        assert_eq!(param_string(&json!({"fluid": 3}), "fluid", "air"), "air");
    }

    // -- parse_numeric_input --

    #[test]
    fn parse_numeric_input_accepts_padded_number() {
        let v = parse_numeric_input("mass1", "  4.5 ").unwrap();
        assert!((v - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_numeric_input_rejects_text() {
        let err = parse_numeric_input("mass1", "heavy").unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        let msg = err.to_string();
        assert!(msg.contains("heavy") && msg.contains("mass1"), "got: {msg}");
    }

    #[test]
    fn parse_numeric_input_rejects_non_finite() {
        assert!(parse_numeric_input("g", "NaN").is_err());
        assert!(parse_numeric_input("g", "inf").is_err());
        assert!(parse_numeric_input("g", "").is_err());
    }

    // -- expect_* --

    #[test]
    fn expect_f64_clamps_into_range() {
        assert!((expect_f64("l", &json!(500.0), 50.0, 200.0).unwrap() - 200.0).abs() < 1e-12);
        assert!((expect_f64("l", &json!(-3), 50.0, 200.0).unwrap() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn expect_f64_parses_numeric_strings() {
        let v = expect_f64("l", &json!("120"), 50.0, 200.0).unwrap();
        assert!((v - 120.0).abs() < 1e-12);
    }

    #[test]
    fn expect_f64_rejects_bad_string_as_invalid_input() {
        let err = expect_f64("l", &json!("long"), 50.0, 200.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn expect_f64_rejects_other_types_as_mismatch() {
        let err = expect_f64("l", &json!(true), 50.0, 200.0).unwrap_err();
        match err {
            EngineError::ParamTypeMismatch { name, got, .. } => {
                assert_eq!(name, "l");
                assert_eq!(got, "boolean");
            }
            other => panic!("expected ParamTypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn expect_usize_clamps_and_rejects() {
        assert_eq!(expect_usize("n", &json!(500), 1, 100).unwrap(), 100);
        assert_eq!(expect_usize("n", &json!(0), 1, 100).unwrap(), 1);
        assert!(expect_usize("n", &json!(-2), 1, 100).is_err());
    }

    #[test]
    fn expect_bool_and_str() {
        assert!(expect_bool("b", &json!(true)).unwrap());
        assert!(expect_bool("b", &json!("yes")).is_err());
        assert_eq!(expect_str("s", &json!("oil")).unwrap(), "oil");
        assert!(expect_str("s", &json!(1)).is_err());
    }

    #[test]
    fn json_type_name_covers_all_variants() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }
}
