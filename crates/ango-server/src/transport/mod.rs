//! Transport layer.
//!
//! The engine only needs an ordered, reliable duplex channel of text frames,
//! one envelope per frame. `ws` adapts an axum WebSocket (and hosts the upgrade
//! handler); `memory` is an in-process pair used by tests and embedders.

pub mod memory;
pub mod ws;

use async_trait::async_trait;

use ango_core::error::Result;

/// Write half. Owned by the connection's single writer.
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Best-effort close once the writer stops.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Read half. Owned by the connection's dispatch loop.
#[async_trait]
pub trait FrameStream: Send + 'static {
    /// Next text frame. `None` is a clean end-of-stream; `Some(Err(_))` is a
    /// transport failure and ends the connection.
    async fn next_text(&mut self) -> Option<Result<String>>;
}
