//! Top-level facade crate for ango.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use ango_core::*;
}

pub mod server {
    pub use ango_server::*;
}
