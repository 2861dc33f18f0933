//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence. Otherwise the filter is built from the
//! configured root level plus a separate level for the HTTP layer.

use std::str::FromStr;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use synapse_usage_core::error::{Result, UsageError};

use crate::config::LogSection;

/// Tracing target of the HTTP-facing handlers.
pub const HTTP_TARGET: &str = "synapse_usage_exporter::transport";

/// Parse a level name. Accepts tracing names and the upper-case names used by
/// the reporting tooling (`WARNING`, `CRITICAL`).
pub fn parse_level(s: &str) -> Result<LevelFilter> {
    let lower = s.trim().to_ascii_lowercase();
    let name = match lower.as_str() {
        "warning" => "warn",
        "critical" | "fatal" => "error",
        "notset" => "trace",
        other => other,
    };
    LevelFilter::from_str(name).map_err(|_| UsageError::Config(format!("unknown log level: {s:?}")))
}

/// Filter directives for the given log config.
pub fn directives(log: &LogSection) -> Result<String> {
    let root = parse_level(&log.level)?;
    let http = parse_level(log.http_level())?;
    Ok(format!("{root},{HTTP_TARGET}={http}"))
}

/// Install the global subscriber.
pub fn init(log: &LogSection) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(directives(log)?)
            .map_err(|e| UsageError::Config(format!("invalid log filter: {e}")))?,
    };
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| UsageError::Internal(format!("tracing init failed: {e}")))?;

    tracing::warn!(level = %log.level, "root log level set");
    tracing::warn!(level = %log.http_level(), "http log level set");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_python_style_levels() {
        assert_eq!(parse_level("WARNING").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("CRITICAL").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn http_level_falls_back_to_root() {
        let log = LogSection {
            level: "INFO".into(),
            http_level: None,
        };
        assert_eq!(
            directives(&log).unwrap(),
            format!("{},{HTTP_TARGET}={}", LevelFilter::INFO, LevelFilter::INFO)
        );

        let log = LogSection {
            level: "INFO".into(),
            http_level: Some("ERROR".into()),
        };
        assert_eq!(
            directives(&log).unwrap(),
            format!("{},{HTTP_TARGET}={}", LevelFilter::INFO, LevelFilter::ERROR)
        );
    }
}
