//! Outbound queue handle.
//!
//! Every sender (callers on other tasks, the dispatch loop, deferreds handed to
//! procedures) encodes into text here and pushes onto one bounded queue. A
//! single writer drains that queue into the transport sink, so frames never
//! interleave.

use tokio::sync::mpsc;

use ango_core::error::{AngoError, Result};
use ango_core::protocol::Envelope;

#[derive(Clone, Debug)]
pub(crate) struct Outbound {
    tx: mpsc::Sender<String>,
}

impl Outbound {
    pub(crate) fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    pub(crate) async fn send(&self, env: &Envelope) -> Result<()> {
        let text = env.to_json()?;
        self.tx
            .send(text)
            .await
            .map_err(|_| AngoError::ConnectionClosed)
    }
}
