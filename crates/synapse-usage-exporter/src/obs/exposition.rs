//! Prometheus text exposition (format 0.0.4).
//!
//! Renders usage gauges in registration order with label pairs in schema
//! order, followed by the build info gauge.

use std::fmt::Write;

use synapse_usage_core::protocol::LabelSchema;

use super::metrics::{REPORTS_METRIC, SKIPPED_VALUES_METRIC};
use super::registry::{BuildInfo, Snapshot};

/// Content type for the scrape response.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Exposed name of the build metadata gauge. Matches what an `Info`
/// metric called `app_build_info` is scraped as.
pub const BUILD_INFO_METRIC: &str = "app_build_info_info";

/// Families rendered outside the usage registry. A usage series must never
/// be exposed under one of these names.
pub const RESERVED_NAMES: [&str; 3] = [BUILD_INFO_METRIC, REPORTS_METRIC, SKIPPED_VALUES_METRIC];

pub fn is_reserved(exposed: &str) -> bool {
    RESERVED_NAMES.contains(&exposed)
}

/// Helper to escape label values.
pub(crate) fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a sample value the way Prometheus parses it.
pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else {
        v.to_string()
    }
}

pub(crate) fn label_str<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render every usage series of the snapshot.
pub fn render_usage(snapshot: &Snapshot, schema: &LabelSchema, out: &mut String) {
    for series in snapshot.series() {
        let name = series.exposed_name();
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(series.help()));
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for (labels, value) in series.slots() {
            let _ = writeln!(
                out,
                "{}{{{}}} {}",
                name,
                label_str(schema.pairs(&labels)),
                format_value(value)
            );
        }
    }
}

/// Render the static build metadata as an always-1 gauge.
pub fn render_build_info(build: &BuildInfo, out: &mut String) {
    let _ = writeln!(out, "# HELP {} Description of the build", BUILD_INFO_METRIC);
    let _ = writeln!(out, "# TYPE {} gauge", BUILD_INFO_METRIC);
    let _ = writeln!(
        out,
        "{}{{{}}} 1",
        BUILD_INFO_METRIC,
        label_str(build.pairs().into_iter())
    );
}
