//! Wire protocol: JSON envelopes exchanged one per transport frame.
//!
//! - `envelope`: the message schema, type taxonomy, and (de)serialization.
//! - `data`: helpers to move typed values in and out of the raw `data` payload.
//!
//! Decoding is panic-free: malformed input is reported as `AngoError::Protocol`
//! so the connection can drop the frame and keep going.

pub mod data;
pub mod envelope;

pub use data::{decode_data, encode_data};
pub use envelope::{Envelope, MessageKind};
