//! Client-side promise bookkeeping for calls this end initiated.

use std::fmt;
use std::sync::Arc;

use serde_json::value::RawValue;
use tokio::sync::oneshot;

use ango_core::error::{AngoError, Result};

/// Callback invoked with the peer's payload (absent when the peer sent none).
pub type PromiseFn = Arc<dyn Fn(Option<Box<RawValue>>) + Send + Sync>;

/// Resolve/reject/notify callbacks for one call.
///
/// Resolve and reject are mandatory: a call without both is refused with
/// [`AngoError::InvalidArgument`] before anything is sent.
#[derive(Clone, Default)]
pub struct PromiseCallbacks {
    resolve: Option<PromiseFn>,
    reject: Option<PromiseFn>,
    notify: Option<PromiseFn>,
}

impl PromiseCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_resolve(mut self, f: impl Fn(Option<Box<RawValue>>) + Send + Sync + 'static) -> Self {
        self.resolve = Some(Arc::new(f));
        self
    }

    pub fn on_reject(mut self, f: impl Fn(Option<Box<RawValue>>) + Send + Sync + 'static) -> Self {
        self.reject = Some(Arc::new(f));
        self
    }

    pub fn on_notify(mut self, f: impl Fn(Option<Box<RawValue>>) + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(f));
        self
    }

    pub(crate) fn validate(self) -> Result<ValidCallbacks> {
        match (self.resolve, self.reject) {
            (Some(resolve), Some(reject)) => Ok(ValidCallbacks {
                resolve,
                reject,
                notify: self.notify,
            }),
            _ => Err(AngoError::InvalidArgument(
                "resolve and reject callbacks must both be set".into(),
            )),
        }
    }
}

impl fmt::Debug for PromiseCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseCallbacks")
            .field("resolve", &self.resolve.is_some())
            .field("reject", &self.reject.is_some())
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

pub(crate) struct ValidCallbacks {
    resolve: PromiseFn,
    reject: PromiseFn,
    notify: Option<PromiseFn>,
}

/// Terminal outcome reported by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settlement {
    Resolved,
    Rejected,
}

/// Registry entry keyed by deferred ID.
pub(crate) struct Promise {
    callbacks: ValidCallbacks,
    done: oneshot::Sender<()>,
}

impl Promise {
    pub(crate) fn new(callbacks: ValidCallbacks, done: oneshot::Sender<()>) -> Self {
        Self { callbacks, done }
    }

    /// Cloned out so the registry lock is released before user code runs.
    pub(crate) fn notify_fn(&self) -> Option<PromiseFn> {
        self.callbacks.notify.clone()
    }

    /// Run the terminal callback, then release any `call_and_wait` waiter.
    pub(crate) fn settle(self, outcome: Settlement, data: Option<Box<RawValue>>) {
        match outcome {
            Settlement::Resolved => (self.callbacks.resolve)(data),
            Settlement::Rejected => (self.callbacks.reject)(data),
        }
        // Nobody is waiting for a plain `call`.
        let _ = self.done.send(());
    }
}
