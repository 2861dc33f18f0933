//! Top-level facade crate for the synapse usage-stats exporter.
//!
//! Re-exports the payload protocol and the exporter library so users can depend on a single crate.

pub mod core {
    pub use synapse_usage_core::*;
}

pub mod exporter {
    pub use synapse_usage_exporter::*;
}
