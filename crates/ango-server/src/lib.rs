//! ango server library entry.
//!
//! This crate wires the transport, connection engine, procedure registry and
//! provider into a bidirectional RPC server. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod config;
pub mod engine;
pub mod procedure;
pub mod provider;
pub mod router;
pub mod services;
pub mod transport;

pub use engine::{CloseReason, Connection, ConnectionOptions, Deferred, PromiseCallbacks};
pub use procedure::{Procedure, ProcedureRegistry};
pub use provider::Provider;
