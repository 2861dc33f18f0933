//! Registry + ingestion behavior for realistic usage reports.

use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use synapse_usage_core::protocol::{LabelSchema, LabelValues, DEFAULT_GAUGES, DEFAULT_LABEL_FIELDS};
use synapse_usage_exporter::ingest::Ingestor;
use synapse_usage_exporter::obs::{MetricRegistry, RegistryOptions};

fn ingestor() -> Ingestor {
    let schema = LabelSchema::new(DEFAULT_LABEL_FIELDS.iter().copied()).unwrap();
    let reg = MetricRegistry::define(DEFAULT_GAUGES.iter().copied(), schema, RegistryOptions::default())
        .unwrap();
    Ingestor::new(Arc::new(reg))
}

/// Label tuple with `homeserver` set and every other field "None".
fn hs_labels(hs: &str) -> LabelValues {
    let mut v = vec![hs.to_string()];
    v.extend(std::iter::repeat("None".to_string()).take(DEFAULT_LABEL_FIELDS.len() - 1));
    LabelValues::new(v)
}

fn entries(ing: &Ingestor, measurement: &str) -> Vec<(LabelValues, f64)> {
    ing.registry()
        .snapshot()
        .iter()
        .filter(|s| s.measurement == measurement)
        .map(|s| (s.labels, s.value))
        .collect()
}

#[test]
fn one_entry_per_measurement_key() {
    let ing = ingestor();
    let report = json!({
        "homeserver": "example.org",
        "server_context": "prod",
        "python_version": "3.11.4",
        "database_engine": "Postgres",
        "database_server_version": "15.3",
        "log_level": "INFO",
        "total_users": 120,
        "daily_active_users": 33,
        "cache_factor": 0.5,
    });
    ing.ingest_value(report).unwrap();

    let snapshot = ing.registry().snapshot();
    let samples: Vec<_> = snapshot.iter().collect();
    assert_eq!(samples.len(), 3);
    let labels = LabelValues::new(["example.org", "prod", "3.11.4", "Postgres", "15.3", "INFO"]);
    for s in &samples {
        assert_eq!(s.labels, labels);
    }
    assert_eq!(entries(&ing, "cache_factor"), vec![(labels, 0.5)]);
}

#[test]
fn scenario_single_report() {
    let ing = ingestor();
    ing.ingest_value(json!({"homeserver": "example.org", "total_users": 42}))
        .unwrap();
    assert_eq!(entries(&ing, "total_users"), vec![(hs_labels("example.org"), 42.0)]);
}

#[test]
fn scenario_repeat_report_overwrites() {
    let ing = ingestor();
    ing.ingest_value(json!({"homeserver": "example.org", "total_users": 42}))
        .unwrap();
    ing.ingest_value(json!({"homeserver": "example.org", "total_users": 50}))
        .unwrap();
    assert_eq!(entries(&ing, "total_users"), vec![(hs_labels("example.org"), 50.0)]);
}

#[test]
fn scenario_falsy_homeserver() {
    let ing = ingestor();
    ing.ingest_value(json!({"homeserver": "", "total_users": 1}))
        .unwrap();
    let got = entries(&ing, "total_users");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].0.get(0), Some("None"));
}

#[test]
fn missing_homeserver_defaults_to_none() {
    let ing = ingestor();
    ing.ingest_value(json!({"total_users": 1})).unwrap();
    assert_eq!(entries(&ing, "total_users"), vec![(hs_labels("None"), 1.0)]);
}

#[test]
fn flag_is_monotonic() {
    let ing = ingestor();
    assert!(!ing.is_initialized());
    let r = ing
        .ingest_value(json!({"homeserver": "hs", "total_users": 1, "daily_messages": 2}))
        .unwrap();
    assert!(r.initialized);

    // Later report without a previously seen key.
    ing.ingest_value(json!({"homeserver": "hs", "total_users": 3}))
        .unwrap();
    assert!(ing.is_initialized());
    // Invalid body does not reset it either.
    assert!(ing.ingest_value(Value::Null).is_err());
    assert!(ing.is_initialized());
    assert_eq!(entries(&ing, "daily_messages"), vec![(hs_labels("hs"), 2.0)]);
}

#[test]
fn identity_change_gets_own_slot() {
    let ing = ingestor();
    ing.ingest_value(json!({"homeserver": "a.org", "total_users": 1}))
        .unwrap();
    // After initialization, a restart under a new name still gets a slot.
    ing.ingest_value(json!({"homeserver": "b.org", "total_users": 2}))
        .unwrap();
    assert_eq!(
        entries(&ing, "total_users"),
        vec![(hs_labels("a.org"), 1.0), (hs_labels("b.org"), 2.0)]
    );
}

#[test]
fn concurrent_first_reports_make_independent_slots() {
    let ing = Arc::new(ingestor());
    let hosts: Vec<String> = (0..8).map(|i| format!("hs{i}.example")).collect();

    thread::scope(|s| {
        for (i, hs) in hosts.iter().enumerate() {
            let ing = Arc::clone(&ing);
            s.spawn(move || {
                for round in 0..50 {
                    ing.ingest_value(json!({"homeserver": hs, "total_users": i * 1000 + round}))
                        .unwrap();
                }
            });
        }
    });

    let got = entries(&ing, "total_users");
    assert_eq!(got.len(), hosts.len());
    for (i, hs) in hosts.iter().enumerate() {
        let (_, v) = got
            .iter()
            .find(|(l, _)| l.get(0) == Some(hs.as_str()))
            .expect("slot per homeserver");
        assert_eq!(*v, (i * 1000 + 49) as f64);
    }
}

#[test]
fn concurrent_ensure_slot_creates_once() {
    let schema = LabelSchema::new(["homeserver"]).unwrap();
    let reg = Arc::new(
        MetricRegistry::define(["total_users"], schema, RegistryOptions::default()).unwrap(),
    );
    let labels = LabelValues::new(["same.org"]);

    let created: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let reg = Arc::clone(&reg);
                let labels = labels.clone();
                s.spawn(move || reg.ensure_slot("total_users", &labels).unwrap() as usize)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(created, 1);
    assert_eq!(reg.snapshot().iter().count(), 1);
}
