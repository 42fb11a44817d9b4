//! Per-session connection engine: outbound operations and lifecycle.
//!
//! A `Connection` is a cheap handle; the work happens in the driver future
//! returned by [`Connection::open`], which runs the single writer and the single
//! inbound dispatch loop (see `dispatch.rs`) side by side.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

use ango_core::error::{AngoError, Result};
use ango_core::protocol::{encode_data, Envelope};
use ango_core::IdGenerator;

use super::outbound::Outbound;
use super::promise::{Promise, PromiseCallbacks};
use crate::procedure::ProcedureRegistry;
use crate::transport::{FrameSink, FrameStream};

/// Per-connection tuning.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Log protocol anomalies (unknown ids/types, missing procedures).
    pub debug: bool,
    /// Capacity of the outbound frame queue.
    pub outbound_queue: usize,
    /// Upper bound for each wait on the peer. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            debug: false,
            outbound_queue: 1024,
            request_timeout: None,
        }
    }
}

/// Why a connection stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseReason {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("transport failure: {0}")]
    TransportFailure(String),
}

/// Delivery acknowledgement for one outbound request.
#[derive(Debug)]
pub(crate) enum Delivery {
    Accepted,
    Denied(String),
}

/// Handle to one live session. Clone freely; all clones drive the same peer.
#[derive(Clone)]
pub struct Connection {
    pub(super) inner: Arc<ConnectionInner>,
}

pub(super) struct ConnectionInner {
    pub(super) id: u64,
    pub(super) options: ConnectionOptions,
    pub(super) procedures: Arc<ProcedureRegistry>,
    pub(super) outbound: Outbound,
    callback_ids: IdGenerator,
    promise_ids: IdGenerator,
    pub(super) callbacks: DashMap<u64, oneshot::Sender<Delivery>>,
    pub(super) promises: DashMap<u64, Promise>,
    closed: watch::Sender<Option<CloseReason>>,
}

impl Connection {
    /// Bind a transport to a new engine.
    ///
    /// The returned driver must be awaited (usually spawned) for anything to
    /// happen. It resolves `Ok(())` when the peer closes cleanly and
    /// `Err(AngoError::Transport)` when reading or writing fails; in both cases
    /// the connection is torn down and every pending waiter is released with
    /// [`AngoError::ConnectionClosed`].
    ///
    /// On a clean end of the inbound stream, frames already queued (replies to
    /// the last requests included) are flushed and the sink is closed before
    /// teardown. A transport error tears down immediately.
    pub fn open<S, R>(
        id: u64,
        procedures: Arc<ProcedureRegistry>,
        options: ConnectionOptions,
        sink: S,
        stream: R,
    ) -> (Self, impl Future<Output = Result<()>> + Send + 'static)
    where
        S: FrameSink,
        R: FrameStream,
    {
        let (out_tx, out_rx) = mpsc::channel::<String>(options.outbound_queue.max(1));
        let (closed, _) = watch::channel(None);

        let conn = Self {
            inner: Arc::new(ConnectionInner {
                id,
                options,
                procedures,
                outbound: Outbound::new(out_tx),
                callback_ids: IdGenerator::new(),
                promise_ids: IdGenerator::new(),
                callbacks: DashMap::new(),
                promises: DashMap::new(),
                closed,
            }),
        };

        let guard = DriverGuard(conn.clone());
        let driver = async move {
            tracing::debug!("connection open");
            let (drain_tx, drain_rx) = oneshot::channel::<()>();
            let reader = guard.0.read_loop(stream);
            let writer = write_loop(out_rx, sink, drain_rx);
            tokio::pin!(reader, writer);

            let first = tokio::select! {
                r = &mut reader => Ended::Reader(r),
                w = &mut writer => Ended::Writer(w),
            };
            let outcome = match first {
                // Replies already queued still go out before the sink closes.
                Ended::Reader(Ok(())) => {
                    let _ = drain_tx.send(());
                    writer.await
                }
                Ended::Reader(Err(e)) => Err(e),
                Ended::Writer(w) => w,
            };
            guard.0.shutdown(&outcome);
            outcome
        }
        .instrument(tracing::info_span!("conn", id));

        (conn, driver)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.borrow().is_some()
    }

    /// Resolves once the connection has been torn down.
    pub async fn closed(&self) -> CloseReason {
        wait_closed(self.inner.closed.subscribe()).await
    }

    /// Invoke `name` on the peer without result tracking.
    ///
    /// Returns once the peer accepted (`Ok`) or denied (`AngoError::Denied`)
    /// delivery. The execution outcome is never observed.
    pub async fn fire<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        let env = Envelope::request(name, Some(encode_data(data)?), None);
        self.send_request(env).await
    }

    /// Invoke `name` on the peer and track its result.
    ///
    /// Returns as soon as delivery is acknowledged; the callbacks run later on
    /// this connection's dispatch loop.
    pub async fn call<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        callbacks: PromiseCallbacks,
    ) -> Result<()> {
        self.call_inner(name, data, callbacks, false).await
    }

    /// Like [`Connection::call`], but also waits until the peer resolved or
    /// rejected and the matching callback has run. Notifications do not end the
    /// wait.
    pub async fn call_and_wait<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        callbacks: PromiseCallbacks,
    ) -> Result<()> {
        self.call_inner(name, data, callbacks, true).await
    }

    async fn call_inner<T: Serialize + ?Sized>(
        &self,
        name: &str,
        data: &T,
        callbacks: PromiseCallbacks,
        wait: bool,
    ) -> Result<()> {
        let callbacks = callbacks.validate()?;
        let raw = encode_data(data)?;

        let deferred_id = self.inner.promise_ids.next_id();
        let (done_tx, done_rx) = oneshot::channel();
        self.inner
            .promises
            .insert(deferred_id, Promise::new(callbacks, done_tx));

        let env = Envelope::request(name, Some(raw), Some(deferred_id));
        if let Err(e) = self.send_request(env).await {
            self.inner.promises.remove(&deferred_id);
            return Err(e);
        }
        if !wait {
            return Ok(());
        }

        self.wait(done_rx).await.map_err(|e| {
            self.inner.promises.remove(&deferred_id);
            e
        })
    }

    async fn send_request(&self, mut env: Envelope) -> Result<()> {
        if self.is_closed() {
            return Err(AngoError::ConnectionClosed);
        }

        let callback_id = self.inner.callback_ids.next_id();
        let (tx, rx) = oneshot::channel();
        self.inner.callbacks.insert(callback_id, tx);
        env.callback_id = Some(callback_id);

        let delivery = match self.inner.outbound.send(&env).await {
            Ok(()) => self.wait(rx).await,
            Err(e) => Err(e),
        };
        match delivery {
            Ok(Delivery::Accepted) => Ok(()),
            Ok(Delivery::Denied(reason)) => Err(AngoError::Denied(reason)),
            Err(e) => {
                self.inner.callbacks.remove(&callback_id);
                Err(e)
            }
        }
    }

    /// Wait on a single-slot signal, bounded by close and the optional timeout.
    async fn wait<T>(&self, rx: oneshot::Receiver<T>) -> Result<T> {
        let closed = wait_closed(self.inner.closed.subscribe());
        let settled = async {
            tokio::select! {
                biased;
                r = rx => r.map_err(|_| AngoError::ConnectionClosed),
                _ = closed => Err(AngoError::ConnectionClosed),
            }
        };
        match self.inner.options.request_timeout {
            Some(limit) => tokio::time::timeout(limit, settled)
                .await
                .map_err(|_| AngoError::Timeout)?,
            None => settled.await,
        }
    }

    fn shutdown(&self, outcome: &Result<()>) {
        let reason = match outcome {
            Ok(()) => CloseReason::PeerClosed,
            Err(e) => CloseReason::TransportFailure(e.to_string()),
        };
        tracing::debug!(%reason, "connection closed");
        self.inner.closed.send_replace(Some(reason));
        // Dropping the senders wakes every waiter with ConnectionClosed.
        self.inner.callbacks.clear();
        self.inner.promises.clear();
    }
}

/// Tears the connection down if the driver is dropped before finishing.
struct DriverGuard(Connection);

impl Drop for DriverGuard {
    fn drop(&mut self) {
        if !self.0.is_closed() {
            self.0
                .shutdown(&Err(AngoError::Internal("connection driver dropped".into())));
        }
    }
}

async fn wait_closed(mut rx: watch::Receiver<Option<CloseReason>>) -> CloseReason {
    loop {
        if let Some(reason) = rx.borrow_and_update().clone() {
            return reason;
        }
        if rx.changed().await.is_err() {
            return CloseReason::PeerClosed;
        }
    }
}

enum Ended {
    Reader(Result<()>),
    Writer(Result<()>),
}

/// Single writer. Once `drain` fires the queue stops accepting frames, whatever
/// is already buffered is flushed, and the sink is closed.
async fn write_loop<S: FrameSink>(
    mut rx: mpsc::Receiver<String>,
    mut sink: S,
    mut drain: oneshot::Receiver<()>,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            text = rx.recv() => match text {
                Some(text) => sink.send_text(text).await?,
                None => break,
            },
            _ = &mut drain => {
                rx.close();
                while let Some(text) = rx.recv().await {
                    sink.send_text(text).await?;
                }
                break;
            }
        }
    }
    sink.close().await
}
