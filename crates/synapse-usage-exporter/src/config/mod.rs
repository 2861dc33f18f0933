//! Exporter config loader (strict parsing).
//!
//! Source order: YAML file, then environment overrides, then validation.
//! The file path comes from `USAGE_EXPORTER_CONFIG`; without it the default
//! path is used when present, and built-in defaults otherwise.

pub mod schema;

use std::fs;
use std::path::Path;

use synapse_usage_core::error::{Result, UsageError};

pub use schema::{BuildSection, ExporterConfig, LogSection, MetricsSection, ServerSection};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "USAGE_EXPORTER_CONFIG";
/// Config file read when present and no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "usage-exporter.yaml";

/// Load config from the process environment.
pub fn load() -> Result<ExporterConfig> {
    let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => parse_file(&path)?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => parse_file(DEFAULT_CONFIG_PATH)?,
        Err(_) => ExporterConfig::default(),
    };
    cfg.apply_env_with(|k| std::env::var(k).ok());
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| UsageError::Config(format!("read config {path} failed: {e}")))?;
    parse_str(&s)
}

fn parse_str(s: &str) -> Result<ExporterConfig> {
    serde_yaml::from_str(s).map_err(|e| UsageError::Config(format!("invalid yaml: {e}")))
}
