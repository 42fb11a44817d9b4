use async_trait::async_trait;
use serde_json::value::RawValue;

use ango_core::error::Result;

use crate::engine::Deferred;
use crate::procedure::Procedure;

const STEPS: [&str; 2] = ["25%", "50%"];

/// Reports progress twice, then resolves with `"done"`.
pub struct ProgressProcedure;

#[async_trait]
impl Procedure for ProgressProcedure {
    async fn call(&self, _data: Option<Box<RawValue>>, deferred: Deferred) -> Result<()> {
        for step in STEPS {
            deferred.notify(step).await?;
        }
        deferred.resolve("done").await
    }
}
