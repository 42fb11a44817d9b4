//! Server-side completion handle for one accepted inbound request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use ango_core::error::{AngoError, Result};
use ango_core::protocol::{encode_data, Envelope};

use super::outbound::Outbound;

/// Handed to a procedure together with the request payload.
///
/// `resolve`/`reject` are terminal and exactly-once: the first one wins, any
/// later one returns [`AngoError::AlreadyCompleted`] and sends nothing. Clones
/// share the completion flag, so this holds even when the handle is moved into
/// another task.
///
/// `notify` may be sent any number of times before the terminal call. It is not
/// checked against completion; notifying after resolve/reject is a caller bug
/// the peer will observe as a notification for an unknown deferred.
///
/// A request sent without `def_id` (a fire) still gets a `Deferred`; completing
/// it is accepted but nothing goes on the wire because the peer tracks nothing.
#[derive(Clone, Debug)]
pub struct Deferred {
    deferred_id: Option<u64>,
    completed: Arc<AtomicBool>,
    outbound: Outbound,
}

impl Deferred {
    pub(crate) fn new(deferred_id: Option<u64>, outbound: Outbound) -> Self {
        Self {
            deferred_id,
            completed: Arc::new(AtomicBool::new(false)),
            outbound,
        }
    }

    /// The peer's deferred ID, if it asked for result tracking.
    pub fn id(&self) -> Option<u64> {
        self.deferred_id
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Resolve the peer's promise with `data`.
    pub async fn resolve<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.complete(Envelope::resolved, data).await
    }

    /// Reject the peer's promise with `data`.
    pub async fn reject<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.complete(Envelope::rejected, data).await
    }

    /// Reject with a reason the engine produced itself. The text goes in both
    /// `data` and `error`.
    pub(crate) async fn reject_with_reason(&self, reason: &str) -> Result<()> {
        self.complete(
            |id, raw| Envelope::rejected(id, raw).with_error(reason),
            reason,
        )
        .await
    }

    /// Send a progress notification.
    pub async fn notify<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        let Some(id) = self.deferred_id else {
            return Ok(());
        };
        let raw = encode_data(data)?;
        self.outbound.send(&Envelope::notification(id, raw)).await
    }

    async fn complete<T, F>(&self, build: F, data: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(u64, Box<serde_json::value::RawValue>) -> Envelope,
    {
        // Encode before claiming so a bad payload leaves the deferred open.
        let raw = encode_data(data)?;
        if self.completed.swap(true, Ordering::AcqRel) {
            return Err(AngoError::AlreadyCompleted);
        }
        match self.deferred_id {
            Some(id) => self.outbound.send(&build(id, raw)).await,
            None => Ok(()),
        }
    }
}
