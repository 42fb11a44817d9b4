//! Typed access to the raw `data` payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{AngoError, Result};

/// Serialize a value into a raw payload.
pub fn encode_data<T: Serialize + ?Sized>(value: &T) -> Result<Box<RawValue>> {
    serde_json::value::to_raw_value(value)
        .map_err(|e| AngoError::Encode(format!("data encode failed: {e}")))
}

/// Parse a raw payload into `T`. Absent data reads as JSON `null`, so
/// `Option<_>` and `()` targets accept it.
pub fn decode_data<T: DeserializeOwned>(data: Option<&RawValue>) -> Result<T> {
    let raw = data.map(RawValue::get).unwrap_or("null");
    serde_json::from_str(raw).map_err(|e| AngoError::Encode(format!("data decode failed: {e}")))
}
