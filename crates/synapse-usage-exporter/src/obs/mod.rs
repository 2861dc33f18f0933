//! Observability: the usage metric registry, its text exposition, exporter
//! self-metrics, and tracing setup.
//!
//! Metrics are stored as atomics in sharded maps and rendered on demand by the
//! `/metrics` handler; nothing runs in the background.

pub mod exposition;
pub mod logging;
pub mod metrics;
pub mod registry;

pub use metrics::ExporterMetrics;
pub use registry::{BuildInfo, MetricRegistry, RegistryOptions, Sample, Series, Snapshot};
