//! Tool trait and related types.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::ToolDefinition;

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Session on whose behalf the tool runs.
    pub session_id: String,
}

/// Result of executing a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    /// Whether the output describes a failure the model should see.
    pub is_error: bool,
}

impl ToolOutput {
    /// Create a successful text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Create an error text output.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// A named capability the model may invoke.
pub trait Tool: Send + Sync {
    /// The unique name of this tool (used in model requests).
    fn name(&self) -> &str;

    /// The definition sent to the model (name, description, input schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON input.
    fn execute(
        &self,
        input: serde_json::Value,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, crate::error::ToolError>> + Send + '_>>;
}
