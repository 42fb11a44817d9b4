//! Inbound dispatch loop.
//!
//! One loop per connection, sole consumer of the stream. Envelopes are handled
//! strictly in arrival order and a procedure runs to completion before the next
//! envelope is read. Anomalies (malformed frames, unknown types, unknown
//! correlation ids) are dropped and only logged when `debug` is set; only a
//! transport error ends the loop with an error.

use tracing::{debug, warn};

use ango_core::error::Result;
use ango_core::protocol::{encode_data, Envelope, MessageKind};

use super::connection::{Connection, Delivery};
use super::deferred::Deferred;
use super::promise::Settlement;
use crate::transport::FrameStream;

/// Rejection sent when a procedure returns without completing its deferred.
pub const HANDLER_INCOMPLETE: &str = "procedure did not resolve nor reject";

impl Connection {
    pub(super) async fn read_loop<R: FrameStream>(&self, mut stream: R) -> Result<()> {
        while let Some(frame) = stream.next_text().await {
            let text = frame?;
            match Envelope::from_json(&text) {
                Ok(env) => self.dispatch(env).await,
                Err(e) => {
                    if self.debug() {
                        warn!(error = %e, "dropping malformed envelope");
                    }
                }
            }
        }
        Ok(())
    }

    fn debug(&self) -> bool {
        self.inner.options.debug
    }

    async fn dispatch(&self, env: Envelope) {
        match env.kind {
            MessageKind::Request => self.on_request(env).await,
            MessageKind::Accepted | MessageKind::Denied => self.on_delivery(env),
            MessageKind::Resolved | MessageKind::Rejected | MessageKind::Notification => {
                self.on_settlement(env)
            }
            MessageKind::Other(ref kind) => {
                if self.debug() {
                    warn!(kind = %kind, "ignoring message with unknown type");
                }
            }
        }
    }

    async fn on_request(&self, env: Envelope) {
        let Envelope {
            procedure,
            callback_id,
            deferred_id,
            data,
            ..
        } = env;

        let Some(callback_id) = callback_id else {
            if self.debug() {
                warn!(procedure = ?procedure, "dropping request without cb_id");
            }
            return;
        };

        let name = procedure.unwrap_or_default();
        let Some(handler) = self.inner.procedures.get(&name) else {
            if self.debug() {
                warn!(procedure = %name, "request for unregistered procedure");
            }
            let reason = format!("procedure with name '{name}' is not defined");
            self.reply(Envelope::denied(callback_id, reason)).await;
            return;
        };

        // Acknowledge delivery before running anything.
        self.reply(Envelope::accepted(callback_id)).await;

        let deferred = Deferred::new(deferred_id, self.inner.outbound.clone());
        let outcome = handler.call(data, deferred.clone()).await;

        if deferred.is_completed() {
            if let Err(e) = outcome {
                debug!(procedure = %name, error = %e, "procedure failed after completing");
            }
            return;
        }

        let reason = match outcome {
            Ok(()) => HANDLER_INCOMPLETE.to_owned(),
            Err(e) => e.to_string(),
        };
        if let Err(e) = deferred.reject_with_reason(&reason).await {
            debug!(procedure = %name, error = %e, "auto-reject not sent");
        }
    }

    fn on_delivery(&self, env: Envelope) {
        let Some(callback_id) = env.callback_id else {
            if self.debug() {
                warn!(kind = env.kind.as_str(), "dropping acknowledgement without cb_id");
            }
            return;
        };

        let Some((_, waiter)) = self.inner.callbacks.remove(&callback_id) else {
            if self.debug() {
                warn!(kind = env.kind.as_str(), cb_id = callback_id, "no waiter for callback id");
            }
            return;
        };

        let delivery = match env.kind {
            MessageKind::Accepted => Delivery::Accepted,
            _ => Delivery::Denied(env.error.unwrap_or_else(|| "no reason given".into())),
        };
        // The waiter may have timed out in the meantime.
        let _ = waiter.send(delivery);
    }

    fn on_settlement(&self, env: Envelope) {
        let Some(deferred_id) = env.deferred_id else {
            if self.debug() {
                warn!(kind = env.kind.as_str(), "dropping settlement without def_id");
            }
            return;
        };

        let outcome = match env.kind {
            MessageKind::Resolved => Settlement::Resolved,
            MessageKind::Rejected => Settlement::Rejected,
            _ => {
                let notify = self.inner.promises.get(&deferred_id).map(|p| p.notify_fn());
                match notify {
                    Some(Some(f)) => f(env.data),
                    Some(None) => {}
                    None => {
                        if self.debug() {
                            warn!(def_id = deferred_id, "notification for unknown deferred id");
                        }
                    }
                }
                return;
            }
        };

        let Some((_, promise)) = self.inner.promises.remove(&deferred_id) else {
            if self.debug() {
                warn!(kind = env.kind.as_str(), def_id = deferred_id, "no promise for deferred id");
            }
            return;
        };

        let data = match outcome {
            Settlement::Resolved => env.data,
            Settlement::Rejected => env
                .data
                .or_else(|| env.error.and_then(|e| encode_data(&e).ok())),
        };
        promise.settle(outcome, data);
    }

    async fn reply(&self, env: Envelope) {
        if let Err(e) = self.inner.outbound.send(&env).await {
            debug!(kind = env.kind.as_str(), error = %e, "reply not sent");
        }
    }
}
