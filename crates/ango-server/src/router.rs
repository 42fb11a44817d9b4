//! Axum router wiring (HTTP -> WS upgrade).
//!
//! Exposes a single websocket route; `ango.js` connects to `/ango-websocket`.

use axum::{routing::get, Router};

use crate::{provider::Provider, transport};

pub fn build_router(provider: Provider, path: &str) -> Router {
    Router::new()
        .route(path, get(transport::ws::ws_upgrade))
        .with_state(provider)
}
