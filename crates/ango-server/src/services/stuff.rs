use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use ango_core::error::Result;

use crate::engine::Deferred;
use crate::procedure::Procedure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stuff {
    pub foo: String,
    pub bar: String,
}

/// Ignores its input and resolves with a fixed `Stuff`.
pub struct StuffProcedure {
    stuff: Stuff,
}

impl StuffProcedure {
    pub fn new(foo: impl Into<String>, bar: impl Into<String>) -> Self {
        Self {
            stuff: Stuff {
                foo: foo.into(),
                bar: bar.into(),
            },
        }
    }
}

#[async_trait]
impl Procedure for StuffProcedure {
    async fn call(&self, _data: Option<Box<RawValue>>, deferred: Deferred) -> Result<()> {
        deferred.resolve(&self.stuff).await
    }
}
