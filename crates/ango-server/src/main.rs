//! ango server
//!
//! - WebSocket endpoint (default `/ango-websocket`) for the `ango.js` client
//! - One connection engine per session, built-in procedures registered
//! - Config from `$ANGO_CONFIG` (default `ango.yaml`)

use tracing_subscriber::{fmt, EnvFilter};

use ango_core::error::{AngoError, Result};
use ango_server::{config, provider::Provider, router, services};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("ANGO_CONFIG").unwrap_or_else(|_| "ango.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    let provider = Provider::builder(cfg.server.connection_options())
        .before_connect(|uri, _headers| {
            tracing::info!(%uri, "new incoming connection");
            Ok(())
        })
        .build();
    services::register_builtin(&provider);

    let app = router::build_router(provider, &cfg.server.path);

    tracing::info!(%listen, path = %cfg.server.path, "ango-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AngoError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AngoError::Internal(format!("server failed: {e}")))
}
