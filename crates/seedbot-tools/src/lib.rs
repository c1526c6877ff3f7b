//! Tool registry and the knowledge-base retrieval tool for Seedbot.

mod registry;
mod retriever;

pub use registry::ToolRegistry;
pub use retriever::RetrieverTool;
