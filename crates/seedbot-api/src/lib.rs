//! OpenAI Chat Completions client with tool calling and retry for Seedbot.

mod client;
mod model;
mod retry;
mod wire;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use model::OpenAiModel;
pub use retry::RetryConfig;
pub use wire::{ChatCompletionRequest, ChatCompletionResponse};
