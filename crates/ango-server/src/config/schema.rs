use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use ango_core::error::{AngoError, Result};

use crate::engine::ConnectionOptions;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AngoError::UnsupportedVersion);
        }

        self.server.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Route the websocket is mounted on.
    #[serde(default = "default_path")]
    pub path: String,

    /// Log protocol anomalies.
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// 0 disables the timeout.
    #[serde(default)]
    pub request_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            debug: false,
            outbound_queue: default_outbound_queue(),
            request_timeout_ms: 0,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.path.starts_with('/') {
            return Err(AngoError::Config("server.path must start with '/'".into()));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(AngoError::Config(
                "server.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        if self.request_timeout_ms != 0 && !(100..=600000).contains(&self.request_timeout_ms) {
            return Err(AngoError::Config(
                "server.request_timeout_ms must be 0 or between 100 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| AngoError::Config(format!("server.listen must be a valid SocketAddr: {e}")))
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            debug: self.debug,
            outbound_queue: self.outbound_queue,
            request_timeout: match self.request_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8123".into()
}
fn default_path() -> String {
    "/ango-websocket".into()
}
fn default_outbound_queue() -> usize {
    1024
}
