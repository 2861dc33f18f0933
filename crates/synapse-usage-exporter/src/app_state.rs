//! Shared application state for the exporter.
//!
//! Built once at startup from the validated config and handed to the router;
//! there is no module-level state.

use std::sync::Arc;

use synapse_usage_core::error::Result;

use crate::config::ExporterConfig;
use crate::ingest::Ingestor;
use crate::obs::{ExporterMetrics, MetricRegistry};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    ingestor: Arc<Ingestor>,
    metrics: Arc<ExporterMetrics>,
}

struct AppStateInner {
    cfg: ExporterConfig,
}

impl AppState {
    /// Build application state.
    /// Registry definition errors are returned so main can exit non-zero.
    pub fn new(cfg: ExporterConfig) -> Result<Self> {
        let schema = cfg.metrics.label_schema()?;
        let registry = MetricRegistry::define(
            &cfg.metrics.gauges,
            schema,
            cfg.metrics.registry_options(),
        )?
        .with_build_info(cfg.build.build_info());

        tracing::info!(
            gauges = registry.series_count(),
            label_fields = ?registry.schema().fields(),
            prefix = %registry.options().prefix,
            "metric registry defined"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            ingestor: Arc::new(Ingestor::new(Arc::new(registry))),
            metrics: Arc::new(ExporterMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &ExporterConfig {
        &self.inner.cfg
    }

    pub fn ingestor(&self) -> Arc<Ingestor> {
        Arc::clone(&self.ingestor)
    }

    pub fn registry(&self) -> &MetricRegistry {
        self.ingestor.registry()
    }

    pub fn metrics(&self) -> Arc<ExporterMetrics> {
        Arc::clone(&self.metrics)
    }
}
