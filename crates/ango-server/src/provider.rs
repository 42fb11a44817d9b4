//! Provider: binds each accepted transport session to a fresh connection engine.
//!
//! A provider owns the procedure registry shared by its connections, the
//! connection-id counter, and the set of live connections. Nothing is global:
//! two providers in one process are fully independent.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use dashmap::DashMap;
use serde_json::value::RawValue;

use ango_core::error::Result;
use ango_core::IdGenerator;

use crate::engine::{Connection, ConnectionOptions, Deferred};
use crate::procedure::{Procedure, ProcedureRegistry};
use crate::transport::{FrameSink, FrameStream};

/// Veto hook run before the websocket upgrade (auth, origin checks, ...).
/// On `Err` the returned response is sent as-is and no connection is created.
pub type BeforeConnect = Arc<dyn Fn(&Uri, &HeaderMap) -> std::result::Result<(), Response> + Send + Sync>;

/// Called with every new connection before its dispatch loop starts.
pub type OnConnect = Arc<dyn Fn(Connection) + Send + Sync>;

#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    options: ConnectionOptions,
    procedures: Arc<ProcedureRegistry>,
    conn_ids: IdGenerator,
    connections: DashMap<u64, Connection>,
    before_connect: Option<BeforeConnect>,
    on_connect: Option<OnConnect>,
}

/// Builder for [`Provider`].
pub struct ProviderBuilder {
    options: ConnectionOptions,
    before_connect: Option<BeforeConnect>,
    on_connect: Option<OnConnect>,
}

impl ProviderBuilder {
    pub fn before_connect<F>(mut self, f: F) -> Self
    where
        F: Fn(&Uri, &HeaderMap) -> std::result::Result<(), Response> + Send + Sync + 'static,
    {
        self.before_connect = Some(Arc::new(f));
        self
    }

    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn(Connection) + Send + Sync + 'static,
    {
        self.on_connect = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Provider {
        Provider {
            inner: Arc::new(ProviderInner {
                options: self.options,
                procedures: Arc::new(ProcedureRegistry::new()),
                conn_ids: IdGenerator::new(),
                connections: DashMap::new(),
                before_connect: self.before_connect,
                on_connect: self.on_connect,
            }),
        }
    }
}

impl Provider {
    pub fn new(options: ConnectionOptions) -> Self {
        Self::builder(options).build()
    }

    pub fn builder(options: ConnectionOptions) -> ProviderBuilder {
        ProviderBuilder {
            options,
            before_connect: None,
            on_connect: None,
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }

    pub fn procedures(&self) -> Arc<ProcedureRegistry> {
        Arc::clone(&self.inner.procedures)
    }

    /// Register (or replace) a procedure for all current and future connections.
    pub fn register_procedure(&self, name: impl Into<String>, procedure: Arc<dyn Procedure>) {
        self.inner.procedures.register(name, procedure);
    }

    pub fn register_procedure_fn<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Option<Box<RawValue>>, Deferred) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.inner.procedures.register_fn(name, f);
    }

    /// Run the veto hook, if any.
    pub fn before_connect(&self, uri: &Uri, headers: &HeaderMap) -> std::result::Result<(), Response> {
        match &self.inner.before_connect {
            Some(hook) => hook(uri, headers),
            None => Ok(()),
        }
    }

    /// Serve one transport session until it closes.
    ///
    /// Returns `Ok(())` on a clean close and the transport error otherwise. The
    /// connection is visible through [`Provider::connection`] while it runs.
    pub async fn accept<S, R>(&self, sink: S, stream: R) -> Result<()>
    where
        S: FrameSink,
        R: FrameStream,
    {
        let id = self.inner.conn_ids.next_id();
        let (conn, driver) = Connection::open(
            id,
            self.procedures(),
            self.inner.options.clone(),
            sink,
            stream,
        );

        self.inner.connections.insert(id, conn.clone());
        let _tracked = Tracked {
            connections: &self.inner.connections,
            id,
        };
        tracing::info!(conn = id, "connection accepted");
        if let Some(hook) = &self.inner.on_connect {
            hook(conn);
        }

        let outcome = driver.await;

        match &outcome {
            Ok(()) => tracing::info!(conn = id, "connection closed"),
            Err(e) => tracing::warn!(conn = id, error = %e, "connection failed"),
        }
        outcome
    }

    pub fn connection(&self, id: u64) -> Option<Connection> {
        self.inner.connections.get(&id).map(|c| c.value().clone())
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }
}

/// Untracks a connection when `accept` ends, including when it is dropped.
struct Tracked<'a> {
    connections: &'a DashMap<u64, Connection>,
    id: u64,
}

impl Drop for Tracked<'_> {
    fn drop(&mut self) {
        self.connections.remove(&self.id);
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("options", &self.inner.options)
            .field("procedures", &self.inner.procedures.names())
            .field("connections", &self.inner.connections.len())
            .finish()
    }
}
