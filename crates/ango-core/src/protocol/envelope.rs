//! Envelope (JSON).
//!
//! `data` is kept as `RawValue` so the payload is carried as an embedded
//! sub-document and only parsed by whoever consumes it. Every optional field is
//! omitted when unset: presence carries meaning, so `cb_id: 0` and "no cb_id"
//! must never be confused.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{AngoError, Result};

/// Message type (`type` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Invoke a named procedure.
    Request,
    /// Request accepted for delivery.
    Accepted,
    /// Request denied.
    Denied,
    /// Terminal: procedure resolved.
    Resolved,
    /// Terminal: procedure rejected.
    Rejected,
    /// Progress notification.
    Notification,
    /// Anything this engine does not speak (kept for logging).
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Request => "req",
            MessageKind::Accepted => "reqa",
            MessageKind::Denied => "reqd",
            MessageKind::Resolved => "res",
            MessageKind::Rejected => "rej",
            MessageKind::Notification => "not",
            MessageKind::Other(s) => s,
        }
    }
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "req" => MessageKind::Request,
            "reqa" => MessageKind::Accepted,
            "reqd" => MessageKind::Denied,
            "res" => MessageKind::Resolved,
            "rej" => MessageKind::Rejected,
            "not" => MessageKind::Notification,
            _ => MessageKind::Other(s),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

/// One message unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Procedure name, requests only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
    /// Delivery correlation (req -> reqa/reqd).
    #[serde(rename = "cb_id", default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<u64>,
    /// Result correlation (req -> res/rej/not).
    #[serde(rename = "def_id", default, skip_serializing_if = "Option::is_none")]
    pub deferred_id: Option<u64>,
    /// Reserved for linked objects.
    #[serde(rename = "lo_id", default, skip_serializing_if = "Option::is_none")]
    pub linked_object_id: Option<u64>,
    /// Opaque payload, stored as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<RawValue>>,
    /// Denial/rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    fn bare(kind: MessageKind) -> Self {
        Self {
            kind,
            procedure: None,
            callback_id: None,
            deferred_id: None,
            linked_object_id: None,
            data: None,
            error: None,
        }
    }

    /// `req`. The caller fills in `callback_id` when it registers a waiter.
    pub fn request(
        procedure: impl Into<String>,
        data: Option<Box<RawValue>>,
        deferred_id: Option<u64>,
    ) -> Self {
        Self {
            procedure: Some(procedure.into()),
            deferred_id,
            data,
            ..Self::bare(MessageKind::Request)
        }
    }

    /// `reqa`.
    pub fn accepted(callback_id: u64) -> Self {
        Self {
            callback_id: Some(callback_id),
            ..Self::bare(MessageKind::Accepted)
        }
    }

    /// `reqd` with a reason.
    pub fn denied(callback_id: u64, error: impl Into<String>) -> Self {
        Self {
            callback_id: Some(callback_id),
            error: Some(error.into()),
            ..Self::bare(MessageKind::Denied)
        }
    }

    /// `res`.
    pub fn resolved(deferred_id: u64, data: Box<RawValue>) -> Self {
        Self::settlement(MessageKind::Resolved, deferred_id, data)
    }

    /// `rej`. The payload travels in `data`, which is what `ango.js` reads.
    pub fn rejected(deferred_id: u64, data: Box<RawValue>) -> Self {
        Self::settlement(MessageKind::Rejected, deferred_id, data)
    }

    /// `not`.
    pub fn notification(deferred_id: u64, data: Box<RawValue>) -> Self {
        Self::settlement(MessageKind::Notification, deferred_id, data)
    }

    /// Also carry a plain-text reason in `error`, for peers that read it there.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    fn settlement(kind: MessageKind, deferred_id: u64, data: Box<RawValue>) -> Self {
        Self {
            deferred_id: Some(deferred_id),
            data: Some(data),
            ..Self::bare(kind)
        }
    }

    /// Encode to one JSON text frame.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AngoError::Encode(format!("envelope encode failed: {e}")))
    }

    /// Decode one JSON text frame.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| AngoError::Protocol(format!("invalid envelope json: {e}")))
    }
}
