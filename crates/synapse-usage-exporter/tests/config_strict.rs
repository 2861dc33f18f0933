use synapse_usage_exporter::config::{self, ExporterConfig};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:8000"
metrics:
  prefx: "synapse_usage_" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.push_path, "/report-usage-stats/push");
    assert_eq!(cfg.server.metrics_path, "/metrics");
    assert_eq!(cfg.metrics.prefix, "synapse_usage_");
    assert_eq!(cfg.metrics.gauges.len(), 25);
    assert_eq!(cfg.metrics.label_fields[0], "homeserver");
    assert_eq!(cfg.build.version, "undefined");
}

#[test]
fn rejects_unsupported_version() {
    assert!(config::load_from_str("version: 2\n").is_err());
}

#[test]
fn rejects_bad_listen_and_paths() {
    let bad_listen = "version: 1\nserver:\n  listen: \"nowhere\"\n";
    assert!(config::load_from_str(bad_listen).is_err());

    let same_paths = r#"
version: 1
server:
  push_path: "/metrics"
  metrics_path: "/metrics"
"#;
    assert!(config::load_from_str(same_paths).is_err());
}

#[test]
fn rejects_bad_label_fields_and_levels() {
    let dup = r#"
version: 1
metrics:
  label_fields: ["homeserver", "homeserver"]
"#;
    assert!(config::load_from_str(dup).is_err());

    let level = "version: 1\nlog:\n  level: chatty\n";
    assert!(config::load_from_str(level).is_err());
}

#[test]
fn rejects_gauges_named_like_exporter_families() {
    let clash = r#"
version: 1
metrics:
  prefix: "usage_exporter_"
  gauges: ["total_users", "reports_total"]
"#;
    let err = config::load_from_str(clash).expect_err("must fail");
    assert!(err.to_string().contains("usage_exporter_reports_total"));

    let unprefixed = r#"
version: 1
metrics:
  prefix: ""
  gauges: ["total_users", "app_build_info_info"]
"#;
    assert!(config::load_from_str(unprefixed).is_err());

    let fine = "version: 1\nmetrics:\n  prefix: \"\"\n";
    assert!(config::load_from_str(fine).is_ok());
}

#[test]
fn custom_schema() {
    let ok = r#"
version: 1
metrics:
  prefix: "hs_"
  gauges: ["total_users"]
  label_fields: ["homeserver"]
  max_label_sets: 4
build:
  version: "1.4.0"
  build: "42"
log:
  level: WARNING
  http_level: ERROR
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.metrics.registry_options().prefix, "hs_");
    assert_eq!(cfg.metrics.registry_options().max_label_sets, 4);
    assert_eq!(cfg.build.build_info().build, "42");
    assert_eq!(cfg.log.http_level(), "ERROR");
}

#[test]
fn env_overrides_win() {
    let mut cfg = ExporterConfig::default();
    cfg.apply_env_with(|k| match k {
        "APP_LOG_LEVEL" => Some("DEBUG".to_string()),
        "APP_VERSION" => Some("2.0".to_string()),
        "BUILD_ID" => Some("ci-7".to_string()),
        "METRICS_PREFIX" => Some("matrix_".to_string()),
        "LISTEN_ADDR" => Some("127.0.0.1:9100".to_string()),
        _ => None,
    });
    cfg.validate().expect("valid after overrides");

    assert_eq!(cfg.log.level, "DEBUG");
    assert_eq!(cfg.log.http_level(), "DEBUG");
    assert_eq!(cfg.build.version, "2.0");
    assert_eq!(cfg.build.build, "ci-7");
    assert_eq!(cfg.metrics.prefix, "matrix_");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 9100);
}
