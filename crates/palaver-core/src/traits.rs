use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{ModelCallError, Result};
use crate::types::{ModelOutput, Payload};

/// Model-call capability bound to an agent node or to the chat host.
///
/// Implementations must surface failures as one of the three
/// `ModelCallError` kinds; the retry layer dispatches on the kind.
pub trait ModelClient: Send + Sync + 'static {
    /// Run a single prompt through the backend model.
    fn invoke(
        &self,
        prompt: &str,
    ) -> BoxFuture<'_, std::result::Result<ModelOutput, ModelCallError>>;
}

/// A tool callable, sync or async, bound to a tool node or registered
/// by name in the tool registry. Lives outside the serializable graph.
#[derive(Clone)]
pub enum ToolBinding {
    Sync(Arc<dyn Fn(Payload) -> Result<Payload> + Send + Sync>),
    Async(Arc<dyn Fn(Payload) -> BoxFuture<'static, Result<Payload>> + Send + Sync>),
}

impl ToolBinding {
    /// Wrap a synchronous function.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Payload) -> Result<Payload> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Wrap an async function.
    pub fn asynchronous<F>(f: F) -> Self
    where
        F: Fn(Payload) -> BoxFuture<'static, Result<Payload>> + Send + Sync + 'static,
    {
        Self::Async(Arc::new(f))
    }

    /// Invoke the callable, awaiting if it is async.
    pub async fn call(&self, input: Payload) -> Result<Payload> {
        match self {
            Self::Sync(f) => f(input),
            Self::Async(f) => f(input).await,
        }
    }
}

impl std::fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("ToolBinding::Sync"),
            Self::Async(_) => f.write_str("ToolBinding::Async"),
        }
    }
}
