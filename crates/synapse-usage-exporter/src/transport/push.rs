//! `PUT /report-usage-stats/push`.
//!
//! The body must be a JSON object. Malformed JSON, a wrong content type and
//! non-object bodies are all answered with 400 and leave the registry untouched.
//! Measurement values that cannot be stored are dropped individually; the
//! report as a whole still succeeds with an empty JSON object.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use synapse_usage_core::error::UsageError;

use super::error::ApiError;
use crate::app_state::AppState;

pub async fn report_usage_stats(
    State(app): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let metrics = app.metrics();

    let body = match body {
        Ok(Json(v)) => v,
        Err(rej) => {
            tracing::info!(error = %rej.body_text(), "rejecting usage report");
            metrics.reports.inc(&[("outcome", "rejected")]);
            return Err(UsageError::InvalidPayload(rej.body_text()).into());
        }
    };

    let report = match app.ingestor().ingest_value(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::info!(error = %e, "rejecting usage report");
            metrics.reports.inc(&[("outcome", "rejected")]);
            return Err(e.into());
        }
    };

    metrics.reports.inc(&[("outcome", "ok")]);
    for s in &report.skipped {
        metrics.skipped_values.inc(&[("reason", s.reason)]);
    }
    tracing::info!(
        labels = ?report.labels.as_slice(),
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        "usage report stored"
    );

    Ok(Json(json!({})))
}
