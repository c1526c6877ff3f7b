//! Conversational agent orchestration for Seedbot.

mod agent;
pub mod prompts;

pub use agent::{
    AgentConfig, AgentEvent, ConversationalAgent, DEFAULT_MAX_TOOL_ITERATIONS,
    DEFAULT_REQUEST_TIMEOUT,
};
