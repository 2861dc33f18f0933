//! Synapse usage core: payload protocol primitives and the shared error type.
//!
//! This crate defines how a usage-stats push is read: which keys are label
//! fields, how label values are normalized, and how measurement values are
//! coerced to numbers. It carries no transport or runtime dependencies so the
//! exporter, tests, and tooling can share it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `UsageError`/`Result` so a malformed
//! report never takes the exporter down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, UsageError};
