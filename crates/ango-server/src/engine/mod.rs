//! Connection engine.
//!
//! - `connection`: the per-session handle (fire/call/call_and_wait) and driver.
//! - `dispatch`: the inbound state machine.
//! - `deferred`/`promise`: the two halves of one in-flight call.

mod connection;
mod deferred;
mod dispatch;
mod outbound;
mod promise;

pub use connection::{CloseReason, Connection, ConnectionOptions};
pub use deferred::Deferred;
pub use dispatch::HANDLER_INCOMPLETE;
pub use promise::{PromiseCallbacks, PromiseFn};
