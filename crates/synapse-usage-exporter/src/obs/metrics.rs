//! Exporter self-metrics.
//!
//! Counters with dynamic labels backed by `DashMap`. Labels are flattened into
//! sorted key vectors to keep deterministic ordering.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use super::exposition::label_str;

/// Family name of the report counter.
pub const REPORTS_METRIC: &str = "usage_exporter_reports_total";
/// Family name of the skipped-value counter.
pub const SKIPPED_VALUES_METRIC: &str = "usage_exporter_skipped_values_total";

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let mut key: Vec<(String, String)> = labels.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();

        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never incremented).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        let mut key: Vec<(String, String)> = labels.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();
        self.map.get(&key).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(Vec<(String, String)>, u64)> = self.map.iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let labels = label_str(key.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            let _ = writeln!(out, "{}{{{}}} {}", name, labels, val);
        }
    }
}

/// Counters describing the exporter's own ingestion.
#[derive(Default)]
pub struct ExporterMetrics {
    /// Reports received, by `outcome` (`ok` | `rejected`).
    pub reports: CounterVec,
    /// Measurement values dropped from otherwise accepted reports, by `reason`.
    pub skipped_values: CounterVec,
}

impl ExporterMetrics {
    pub fn render(&self, out: &mut String) {
        self.reports.render(REPORTS_METRIC, "Usage reports received", out);
        self.skipped_values.render(
            SKIPPED_VALUES_METRIC,
            "Measurement values dropped from accepted reports",
            out,
        );
    }
}
