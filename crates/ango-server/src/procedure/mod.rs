//! Procedure registry module exports.
//!
//! Re-exports the registry and procedure trait so downstream consumers can
//! depend on this module directly.

pub mod registry;

pub use registry::{Procedure, ProcedureFn, ProcedureRegistry};
