//! Report ingestion.
//!
//! Splits a report into label fields and measurements and writes the
//! measurements into the registry under the report's label tuple.

pub mod handler;

pub use handler::{IngestReport, Ingestor, SkippedValue};
