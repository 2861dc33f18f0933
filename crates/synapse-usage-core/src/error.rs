//! Shared error type across the synapse-usage crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed report.
    BadRequest,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, UsageError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum UsageError {
    /// Request body absent or not a JSON object.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// A measurement value is not numeric-coercible.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    /// Measurement name was never defined as a series.
    #[error("unknown measurement: {0}")]
    UnknownMeasurement(String),
    /// No value slot exists yet for this label tuple.
    #[error("no slot for {measurement} with labels {labels:?}")]
    SlotMissing {
        measurement: String,
        labels: Vec<String>,
    },
    /// Label tuple length does not match the label schema.
    #[error("label arity mismatch: expected {expected}, got {got}")]
    LabelArity { expected: usize, got: usize },
    /// Series already holds the maximum number of label sets.
    #[error("cardinality limit reached for {measurement} ({limit} label sets)")]
    CardinalityExceeded { measurement: String, limit: usize },
    /// Startup configuration or schema definition is invalid.
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl UsageError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            UsageError::Internal(_) => ClientCode::Internal,
            _ => ClientCode::BadRequest,
        }
    }

    /// Short, label-safe name of the error kind (used in counters and logs).
    pub fn kind(&self) -> &'static str {
        match self {
            UsageError::InvalidPayload(_) => "invalid_payload",
            UsageError::InvalidValue { .. } => "invalid_value",
            UsageError::UnknownMeasurement(_) => "unknown_measurement",
            UsageError::SlotMissing { .. } => "slot_missing",
            UsageError::LabelArity { .. } => "label_arity",
            UsageError::CardinalityExceeded { .. } => "cardinality_exceeded",
            UsageError::Config(_) => "config",
            UsageError::Internal(_) => "internal",
        }
    }
}
