use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use synapse_usage_core::error::{Result, UsageError};
use synapse_usage_core::protocol::{coerce_value, payload_from_value, LabelValues, Payload};

use crate::obs::MetricRegistry;

/// A measurement dropped from an otherwise accepted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedValue {
    pub key: String,
    /// `UsageError::kind` of the failure.
    pub reason: &'static str,
    pub detail: String,
}

/// Outcome of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub labels: LabelValues,
    pub updated: Vec<String>,
    pub skipped: Vec<SkippedValue>,
    /// Label initialization flag after this report (always `true`).
    pub initialized: bool,
}

/// Writes reports into a shared [`MetricRegistry`].
///
/// Until the first report has been processed every measurement goes through
/// `ensure_slot` before `set_value`. Afterwards the slot is assumed to exist
/// and only created when `set_value` finds it missing (new measurement key or
/// new reporting identity). Unknown measurement keys are registered on demand.
pub struct Ingestor {
    registry: Arc<MetricRegistry>,
    labels_initialized: AtomicBool,
}

impl Ingestor {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self {
            registry,
            labels_initialized: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Whether a report has been fully processed. Never goes back to `false`.
    pub fn is_initialized(&self) -> bool {
        self.labels_initialized.load(Ordering::Acquire)
    }

    /// Ingest a decoded JSON body. Non-object bodies are rejected untouched.
    pub fn ingest_value(&self, body: Value) -> Result<IngestReport> {
        let payload = payload_from_value(body)?;
        Ok(self.ingest(&payload))
    }

    /// Ingest one report. Per-key failures are logged and reported, never fatal.
    pub fn ingest(&self, payload: &Payload) -> IngestReport {
        let schema = self.registry.schema();
        let labels = schema.extract(payload);
        let initialized = self.is_initialized();
        if !initialized {
            tracing::debug!(labels = ?labels.as_slice(), "initialize labels");
        }

        let mut updated = Vec::new();
        let mut skipped = Vec::new();
        for (key, raw) in payload {
            if schema.contains(key) {
                continue;
            }
            match self.store(key, raw, &labels, initialized) {
                Ok(()) => {
                    tracing::debug!(key = %key, value = %raw, "receive value");
                    updated.push(key.clone());
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "dropping value");
                    skipped.push(SkippedValue {
                        key: key.clone(),
                        reason: e.kind(),
                        detail: e.to_string(),
                    });
                }
            }
        }

        self.labels_initialized.store(true, Ordering::Release);
        IngestReport {
            labels,
            updated,
            skipped,
            initialized: true,
        }
    }

    fn store(&self, key: &str, raw: &Value, labels: &LabelValues, initialized: bool) -> Result<()> {
        let value = coerce_value(key, raw)?;
        if !initialized {
            self.prepare(key, labels)?;
        }
        match self.registry.set_value(key, labels, value) {
            Err(UsageError::SlotMissing { .. }) | Err(UsageError::UnknownMeasurement(_)) => {
                self.prepare(key, labels)?;
                self.registry.set_value(key, labels, value)
            }
            other => other,
        }
    }

    fn prepare(&self, key: &str, labels: &LabelValues) -> Result<()> {
        if self.registry.register(key)? {
            tracing::info!(measurement = %key, "registered measurement on demand");
        }
        if self.registry.ensure_slot(key, labels)? {
            tracing::debug!(measurement = %key, labels = ?labels.as_slice(), "created slot");
        }
        Ok(())
    }
}
