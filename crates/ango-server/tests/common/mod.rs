//! Shared helpers: wire two engines (or an engine and a raw peer) over the
//! in-memory transport, and record promise callbacks.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ango_core::error::Result;
use ango_core::protocol::Envelope;
use ango_server::transport::memory::{self, MemorySink, MemoryStream};
use ango_server::transport::{FrameSink, FrameStream};
use ango_server::{Connection, ConnectionOptions, ProcedureRegistry, PromiseCallbacks};

pub fn debug_options() -> ConnectionOptions {
    ConnectionOptions {
        debug: true,
        ..ConnectionOptions::default()
    }
}

pub struct Pair {
    pub server: Connection,
    pub client: Connection,
    pub server_task: JoinHandle<Result<()>>,
    pub client_task: JoinHandle<Result<()>>,
}

pub fn connect(server_procs: Arc<ProcedureRegistry>, client_procs: Arc<ProcedureRegistry>) -> Pair {
    let ((s_sink, s_stream), (c_sink, c_stream)) = memory::pair(64);
    let (server, server_driver) = Connection::open(1, server_procs, debug_options(), s_sink, s_stream);
    let (client, client_driver) = Connection::open(1, client_procs, debug_options(), c_sink, c_stream);
    Pair {
        server,
        client,
        server_task: tokio::spawn(server_driver),
        client_task: tokio::spawn(client_driver),
    }
}

/// The far end is driven by hand, frame by frame.
pub struct RawPeer {
    pub sink: MemorySink,
    pub stream: MemoryStream,
}

impl RawPeer {
    pub async fn send(&mut self, frame: &str) {
        self.sink.send_text(frame.to_string()).await.unwrap();
    }

    pub async fn recv(&mut self) -> Envelope {
        recv_from(&mut self.stream).await
    }

    /// True when nothing arrives within a short grace period.
    pub async fn is_quiet(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(50), self.stream.next_text())
            .await
            .is_err()
    }
}

/// Next envelope from a bare stream, for a peer that already dropped its sink.
pub async fn recv_from(stream: &mut MemoryStream) -> Envelope {
    let frame = tokio::time::timeout(Duration::from_secs(2), stream.next_text())
        .await
        .expect("peer frame timed out")
        .expect("stream ended")
        .expect("transport error");
    Envelope::from_json(&frame).unwrap()
}

/// True once the stream reports a clean end.
pub async fn ended(stream: &mut MemoryStream) -> bool {
    matches!(
        tokio::time::timeout(Duration::from_secs(2), stream.next_text()).await,
        Ok(None)
    )
}

pub fn connect_raw(
    procs: Arc<ProcedureRegistry>,
    options: ConnectionOptions,
) -> (Connection, JoinHandle<Result<()>>, RawPeer) {
    let ((sink, stream), (peer_sink, peer_stream)) = memory::pair(64);
    let (conn, driver) = Connection::open(1, procs, options, sink, stream);
    let peer = RawPeer {
        sink: peer_sink,
        stream: peer_stream,
    };
    (conn, tokio::spawn(driver), peer)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Resolve(String),
    Reject(String),
    Notify(String),
}

fn text(data: Option<Box<serde_json::value::RawValue>>) -> String {
    data.map(|d| d.get().to_owned()).unwrap_or_default()
}

/// Callbacks that push every invocation onto a channel, in order.
pub fn recorder() -> (PromiseCallbacks, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (t1, t2, t3) = (tx.clone(), tx.clone(), tx);
    let callbacks = PromiseCallbacks::new()
        .on_resolve(move |d| {
            let _ = t1.send(Event::Resolve(text(d)));
        })
        .on_reject(move |d| {
            let _ = t2.send(Event::Reject(text(d)));
        })
        .on_notify(move |d| {
            let _ = t3.send(Event::Notify(text(d)));
        });
    (callbacks, rx)
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event timed out")
        .expect("recorder dropped")
}
