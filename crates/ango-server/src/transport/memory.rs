//! In-process transport: two connected ends backed by bounded channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use ango_core::error::{AngoError, Result};

use super::{FrameSink, FrameStream};

pub struct MemorySink {
    tx: mpsc::Sender<Result<String>>,
}

pub struct MemoryStream {
    rx: mpsc::Receiver<Result<String>>,
}

/// Build a connected pair. Frames written to one end's sink arrive on the
/// other end's stream. Dropping a sink ends the opposite stream cleanly.
pub fn pair(capacity: usize) -> ((MemorySink, MemoryStream), (MemorySink, MemoryStream)) {
    let capacity = capacity.max(1);
    let (a_tx, a_rx) = mpsc::channel(capacity);
    let (b_tx, b_rx) = mpsc::channel(capacity);
    (
        (MemorySink { tx: a_tx }, MemoryStream { rx: b_rx }),
        (MemorySink { tx: b_tx }, MemoryStream { rx: a_rx }),
    )
}

impl MemorySink {
    /// Make the opposite stream report a transport failure.
    pub async fn fail(&self, reason: impl Into<String>) -> Result<()> {
        self.tx
            .send(Err(AngoError::Transport(reason.into())))
            .await
            .map_err(|_| AngoError::ConnectionClosed)
    }
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.tx
            .send(Ok(text))
            .await
            .map_err(|_| AngoError::Transport("memory peer dropped".into()))
    }
}

#[async_trait]
impl FrameStream for MemoryStream {
    async fn next_text(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }
}
