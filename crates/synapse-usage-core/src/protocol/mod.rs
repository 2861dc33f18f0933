//! Usage-report protocol.
//!
//! A report is a flat JSON object. Keys listed in the label schema identify
//! the reporting homeserver and become metric labels; every other key is a
//! measurement whose value is coerced to `f64`.
//!
//! All helpers are panic-free: malformed values are reported as `UsageError`
//! so one bad field never poisons the rest of a report.

pub mod fields;
pub mod labels;
pub mod value;

pub use fields::{DEFAULT_GAUGES, DEFAULT_LABEL_FIELDS, DEFAULT_METRICS_PREFIX};
pub use labels::{LabelSchema, LabelValues, MISSING_LABEL};
pub use value::coerce_value;

/// A decoded usage report.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Interpret a decoded JSON body as a report. Anything but an object is rejected.
pub fn payload_from_value(v: serde_json::Value) -> crate::Result<Payload> {
    match v {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Err(crate::UsageError::InvalidPayload(
            "request body is empty".into(),
        )),
        other => Err(crate::UsageError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
