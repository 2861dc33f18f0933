//! Measurement value coercion.

use serde_json::Value;

use super::json_kind;
use crate::error::{Result, UsageError};

/// Coerce a reported measurement to `f64`.
///
/// Numbers pass through, booleans map to `1.0`/`0.0`, and strings are parsed
/// as floats (surrounding whitespace ignored, `nan`/`inf` accepted). `null`,
/// arrays and objects are rejected.
pub fn coerce_value(key: &str, v: &Value) -> Result<f64> {
    match v {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(key, "number out of range")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(key, &format!("{s:?} is not a number: {e}"))),
        other => Err(invalid(key, &format!("{} is not numeric", json_kind(other)))),
    }
}

fn invalid(key: &str, reason: &str) -> UsageError {
    UsageError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
