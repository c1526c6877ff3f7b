//! Language-model trait.

use crate::{ApiError, ModelRequest, ModelResponse};
use std::future::Future;
use std::pin::Pin;

/// A language-model provider that can answer one [`ModelRequest`].
///
/// Dyn-compatible so the agent can hold `Arc<dyn LanguageModel>`.
pub trait LanguageModel: Send + Sync {
    /// Run one completion. The response carries either final text or tool
    /// calls for the agent to execute.
    fn complete<'a>(
        &'a self,
        request: &'a ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse, ApiError>> + Send + 'a>>;

    /// Provider name for logging (e.g., "openai").
    fn name(&self) -> &str;
}
