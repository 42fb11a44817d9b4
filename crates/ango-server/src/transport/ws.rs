//! WebSocket transport (axum).
//!
//! Responsibilities:
//! - Run the provider's `before_connect` hook before upgrading HTTP -> WS
//! - Hand the split socket to the provider as a text-frame sink/stream
//!
//! Text frames carry envelopes. Binary frames holding UTF-8 are accepted as
//! text; anything else is skipped. Ping/pong is answered by the websocket
//! layer itself. A close frame ends the stream cleanly.

use async_trait::async_trait;
use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    http::{HeaderMap, Uri},
    response::Response,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use ango_core::error::{AngoError, Result};

use super::{FrameSink, FrameStream};
use crate::provider::Provider;

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(provider): State<Provider>,
    uri: Uri,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if let Err(rejection) = provider.before_connect(&uri, &headers) {
        tracing::debug!(%uri, "connection vetoed before upgrade");
        return rejection;
    }

    ws.on_upgrade(move |socket| async move {
        let (tx, rx) = socket.split();
        if let Err(e) = provider.accept(WsSink(tx), WsStream(rx)).await {
            tracing::warn!(error = %e, "websocket session ended with error");
        }
    })
}

// --------------------
// Frame adapters
// --------------------
pub struct WsSink(SplitSink<WebSocket, Message>);

pub struct WsStream(SplitStream<WebSocket>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.0
            .send(Message::Text(text))
            .await
            .map_err(|e| AngoError::Transport(format!("websocket send failed: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        self.0
            .close()
            .await
            .map_err(|e| AngoError::Transport(format!("websocket close failed: {e}")))
    }
}

#[async_trait]
impl FrameStream for WsStream {
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            let msg = match self.0.next().await? {
                Ok(msg) => msg,
                Err(e) => {
                    return Some(Err(AngoError::Transport(format!(
                        "websocket read failed: {e}"
                    ))))
                }
            };
            match msg {
                Message::Text(s) => return Some(Ok(s)),
                Message::Binary(b) => match String::from_utf8(b) {
                    Ok(s) => return Some(Ok(s)),
                    Err(_) => tracing::debug!("skipping non-utf8 binary frame"),
                },
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => return None,
            }
        }
    }
}
