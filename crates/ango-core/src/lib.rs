//! ango core: transport-agnostic protocol primitives, error types, and ID counters.
//!
//! This crate defines the wire-level envelope and error surface shared by the
//! server engine and any other peer implementation. It carries no transport or
//! runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `AngoError`/`Result` so a malformed
//! envelope from one peer never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod ids;
pub mod protocol;

/// Shared result type.
pub use error::{AngoError, Result};
pub use ids::IdGenerator;
