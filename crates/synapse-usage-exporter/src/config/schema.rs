use std::net::SocketAddr;

use serde::Deserialize;
use synapse_usage_core::error::{Result, UsageError};
use synapse_usage_core::protocol::fields::is_valid_metric_name;
use synapse_usage_core::protocol::{
    LabelSchema, DEFAULT_GAUGES, DEFAULT_LABEL_FIELDS, DEFAULT_METRICS_PREFIX,
};

use crate::obs::exposition::is_reserved;
use crate::obs::logging::parse_level;
use crate::obs::{BuildInfo, RegistryOptions};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub log: LogSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
            build: BuildSection::default(),
            log: LogSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(UsageError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;
        self.log.validate()?;

        Ok(())
    }

    /// Apply environment overrides. `get` is `std::env::var` in production.
    pub fn apply_env_with<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("APP_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = get("WERKZEUG_LOG_LEVEL") {
            self.log.http_level = Some(v);
        }
        if let Some(v) = get("APP_VERSION") {
            self.build.version = v;
        }
        if let Some(v) = get("BUILD_ID") {
            self.build.build = v;
        }
        if let Some(v) = get("METRICS_PREFIX") {
            self.metrics.prefix = v;
        }
        if let Some(v) = get("LISTEN_ADDR") {
            self.server.listen = v;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_push_path")]
    pub push_path: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            push_path: default_push_path(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        for (field, path) in [("push_path", &self.push_path), ("metrics_path", &self.metrics_path)] {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(UsageError::Config(format!(
                    "server.{field} must be an absolute path, got {path:?}"
                )));
            }
            if path == "/healthz" {
                return Err(UsageError::Config(format!("server.{field} must not be /healthz")));
            }
        }
        if self.push_path == self.metrics_path {
            return Err(UsageError::Config(
                "server.push_path and server.metrics_path must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            UsageError::Config(format!("server.listen {:?} is not a socket address: {e}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_push_path() -> String {
    "/report-usage-stats/push".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Predeclared measurements.
    #[serde(default = "default_gauges")]
    pub gauges: Vec<String>,

    /// Label fields, in label order.
    #[serde(default = "default_label_fields")]
    pub label_fields: Vec<String>,

    #[serde(default = "default_max_label_sets")]
    pub max_label_sets: usize,

    #[serde(default = "default_max_series")]
    pub max_series: usize,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            gauges: default_gauges(),
            label_fields: default_label_fields(),
            max_label_sets: default_max_label_sets(),
            max_series: default_max_series(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        // An empty prefix is fine; otherwise it must start a valid metric name.
        if !self.prefix.is_empty() && !is_valid_metric_name(&self.prefix) {
            return Err(UsageError::Config(format!(
                "metrics.prefix {:?} is not a valid metric name prefix",
                self.prefix
            )));
        }
        if let Some(g) = self.gauges.iter().find(|g| is_reserved(&format!("{}{g}", self.prefix))) {
            return Err(UsageError::Config(format!(
                "metrics.gauges: {}{g} is already used by the exporter",
                self.prefix
            )));
        }
        self.label_schema()?;
        if self.max_label_sets == 0 {
            return Err(UsageError::Config("metrics.max_label_sets must be > 0".into()));
        }
        if self.max_series < self.gauges.len() {
            return Err(UsageError::Config(
                "metrics.max_series must cover all predeclared gauges".into(),
            ));
        }
        Ok(())
    }

    pub fn label_schema(&self) -> Result<LabelSchema> {
        LabelSchema::new(self.label_fields.iter().cloned())
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            prefix: self.prefix.clone(),
            max_label_sets: self.max_label_sets,
            max_series: self.max_series.max(1),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_METRICS_PREFIX.into()
}
fn default_gauges() -> Vec<String> {
    DEFAULT_GAUGES.iter().map(|s| s.to_string()).collect()
}
fn default_label_fields() -> Vec<String> {
    DEFAULT_LABEL_FIELDS.iter().map(|s| s.to_string()).collect()
}
fn default_max_label_sets() -> usize {
    1024
}
fn default_max_series() -> usize {
    256
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default = "default_undefined")]
    pub version: String,

    #[serde(default = "default_undefined")]
    pub build: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            version: default_undefined(),
            build: default_undefined(),
        }
    }
}

impl BuildSection {
    pub fn build_info(&self) -> BuildInfo {
        BuildInfo {
            version: self.version.clone(),
            build: self.build.clone(),
        }
    }
}

fn default_undefined() -> String {
    "undefined".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Level for the HTTP layer; falls back to `level`.
    #[serde(default)]
    pub http_level: Option<String>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            http_level: None,
        }
    }
}

impl LogSection {
    pub fn validate(&self) -> Result<()> {
        parse_level(&self.level)?;
        if let Some(l) = &self.http_level {
            parse_level(l)?;
        }
        Ok(())
    }

    pub fn http_level(&self) -> &str {
        self.http_level.as_deref().unwrap_or(&self.level)
    }
}

fn default_log_level() -> String {
    "info".into()
}
