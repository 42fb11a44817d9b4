//! Built-in procedures registered by the `ango-server` binary.

mod echo;
mod progress;
mod stuff;

use std::sync::Arc;

use crate::provider::Provider;

pub use echo::EchoProcedure;
pub use progress::ProgressProcedure;
pub use stuff::{Stuff, StuffProcedure};

pub fn register_builtin(provider: &Provider) {
    provider.register_procedure("echo", Arc::new(EchoProcedure));
    provider.register_procedure("getStuff", Arc::new(StuffProcedure::new("foo", "bar")));
    provider.register_procedure("progress", Arc::new(ProgressProcedure));
}
