use async_trait::async_trait;
use serde_json::value::RawValue;

use ango_core::error::Result;

use crate::engine::Deferred;
use crate::procedure::Procedure;

/// Resolves with whatever it was sent. Useful to prove both directions work.
pub struct EchoProcedure;

#[async_trait]
impl Procedure for EchoProcedure {
    async fn call(&self, data: Option<Box<RawValue>>, deferred: Deferred) -> Result<()> {
        match data {
            Some(raw) => deferred.resolve(&*raw).await,
            None => deferred.resolve(&()).await,
        }
    }
}
