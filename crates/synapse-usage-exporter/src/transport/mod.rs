//! Transport layer (HTTP).
//!
//! Accepts usage reports and maps `UsageError` onto HTTP responses.

pub mod error;
pub mod push;
