use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::value::RawValue;

use ango_core::error::Result;

use crate::engine::Deferred;

/// A named procedure the peer can invoke.
///
/// Runs inside the connection's dispatch loop. It should settle `deferred`
/// before returning; if it does not, the engine rejects on its behalf (with the
/// error text when it returned `Err`).
#[async_trait]
pub trait Procedure: Send + Sync {
    async fn call(&self, data: Option<Box<RawValue>>, deferred: Deferred) -> Result<()>;
}

/// Adapter so plain async closures can be registered.
pub struct ProcedureFn<F>(pub F);

#[async_trait]
impl<F, Fut> Procedure for ProcedureFn<F>
where
    F: Fn(Option<Box<RawValue>>, Deferred) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn call(&self, data: Option<Box<RawValue>>, deferred: Deferred) -> Result<()> {
        (self.0)(data, deferred).await
    }
}

/// Name -> procedure map shared by every connection of a provider.
///
/// Registration may happen at any time, concurrently with lookups from live
/// dispatch loops. The last registration for a name wins.
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: DashMap<String, Arc<dyn Procedure>>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self {
            procedures: DashMap::new(),
        }
    }

    pub fn register(&self, name: impl Into<String>, procedure: Arc<dyn Procedure>) {
        let name = name.into();
        if self.procedures.insert(name.clone(), procedure).is_some() {
            tracing::debug!(procedure = %name, "procedure replaced");
        }
    }

    pub fn register_fn<F, Fut>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Option<Box<RawValue>>, Deferred) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(name, Arc::new(ProcedureFn(f)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Procedure>> {
        self.procedures.get(name).map(|e| e.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.procedures.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_registration_replaces_earlier() {
        let reg = ProcedureRegistry::new();
        assert!(!reg.contains("echo"));

        reg.register_fn("echo", |_data, d: Deferred| async move { d.resolve("a").await });
        reg.register_fn("echo", |_data, d: Deferred| async move { d.resolve("b").await });

        assert!(reg.contains("echo"));
        assert!(reg.get("echo").is_some());
        assert_eq!(reg.names(), vec!["echo".to_string()]);
        assert!(reg.get("missing").is_none());
    }
}
