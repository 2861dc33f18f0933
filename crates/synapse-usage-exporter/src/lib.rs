//! Synapse usage-stats exporter library entry.
//!
//! This crate wires config, the metric registry, report ingestion, and the
//! HTTP surface into one service. It is intended to be consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod ingest;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
