//! Label schema and label value extraction.
//!
//! The schema is the ordered list of label field names. A `LabelValues`
//! tuple is positional: entry `i` is the value of `schema.fields()[i]`.
//! Every tuple handed to the registry is built by [`LabelSchema::extract`],
//! so positions cannot drift from names.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use super::fields::is_valid_label_name;
use super::Payload;
use crate::error::{Result, UsageError};

/// Placeholder for a missing or falsy label field.
pub const MISSING_LABEL: &str = "None";

/// Ordered, validated label field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    fields: Arc<[String]>,
}

impl LabelSchema {
    /// Build a schema. Names must be valid Prometheus label names and unique.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(fields.len());
        for f in &fields {
            if !is_valid_label_name(f) {
                return Err(UsageError::Config(format!("invalid label field name: {f:?}")));
            }
            if !seen.insert(f.as_str()) {
                return Err(UsageError::Config(format!("duplicate label field: {f}")));
            }
        }
        Ok(Self {
            fields: fields.into(),
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a payload key is a label field (as opposed to a measurement).
    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f == key)
    }

    /// Extract the label tuple from a report, in schema order.
    pub fn extract(&self, payload: &Payload) -> LabelValues {
        LabelValues(
            self.fields
                .iter()
                .map(|f| label_value(payload.get(f)))
                .collect(),
        )
    }

    /// Reject tuples whose length does not match the schema.
    pub fn check(&self, values: &LabelValues) -> Result<()> {
        if values.len() != self.len() {
            return Err(UsageError::LabelArity {
                expected: self.len(),
                got: values.len(),
            });
        }
        Ok(())
    }

    /// Zip field names with a tuple's values.
    pub fn pairs<'a>(&'a self, values: &'a LabelValues) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(values.iter())
    }
}

/// One label value per schema field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelValues(Vec<String>);

impl LabelValues {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }
}

/// Normalize one label field. Missing and falsy values become `"None"`.
pub fn label_value(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) | Some(Value::Bool(false)) => MISSING_LABEL.to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::String(s)) if s.is_empty() => MISSING_LABEL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => MISSING_LABEL.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(a)) if a.is_empty() => MISSING_LABEL.to_string(),
        Some(Value::Object(o)) if o.is_empty() => MISSING_LABEL.to_string(),
        Some(other) => other.to_string(),
    }
}
