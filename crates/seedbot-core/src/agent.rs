//! The conversational agent: one model invocation per user turn, looping
//! through tool calls, with the exchange recorded in the history store.

use seedbot_history::HistoryStore;
use seedbot_tools::ToolRegistry;
use seedbot_types::{
    ChatMessage, LanguageModel, ModelRequest, SeedbotError, ToolContext, ToolError, ToolOutput,
    Turn, Usage, ellipsize,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::prompts;

/// Default cap on model invocations per turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 15;

/// Default deadline for one turn.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Bytes of tool output carried in [`AgentEvent::ToolEnd`].
const TOOL_OUTPUT_PREVIEW: usize = 200;

/// Events emitted while a turn is being answered.
#[derive(Debug)]
pub enum AgentEvent {
    /// A tool is about to be executed.
    ToolStart { name: String, input: String },
    /// A tool has finished executing.
    ToolEnd {
        name: String,
        output: String,
        is_error: bool,
    },
    /// Token usage accumulated over the turn.
    Usage(Usage),
    /// The turn completed and was recorded.
    Done,
    /// The turn was cancelled (e.g. Ctrl+C).
    Cancelled,
    /// The turn failed.
    Error(String),
}

/// Model and loop settings fixed at construction.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: String,
    pub max_tool_iterations: usize,
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: Some(0.7),
            max_tokens: None,
            system_prompt: prompts::SEEDBOT_PROMPT.to_string(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Answers user messages for any number of sessions.
///
/// Turns within one session are serialized: the session log's lock is held
/// from reading prior turns until the new exchange is appended. Distinct
/// sessions run concurrently.
pub struct ConversationalAgent {
    model: Arc<dyn LanguageModel>,
    registry: ToolRegistry,
    history: Arc<HistoryStore>,
    config: AgentConfig,
}

impl ConversationalAgent {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        registry: ToolRegistry,
        history: Arc<HistoryStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            model,
            registry,
            history,
            config,
        }
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer `user_text` in the context of `session_id`.
    pub async fn respond(&self, session_id: &str, user_text: &str) -> Result<String, SeedbotError> {
        self.respond_with(session_id, user_text, CancellationToken::new(), |_| {})
            .await
    }

    /// Like [`respond`](Self::respond), with cancellation and progress events.
    ///
    /// On success the user turn and then the assistant turn are appended to
    /// the session's log. On any failure the log is left untouched.
    pub async fn respond_with<F>(
        &self,
        session_id: &str,
        user_text: &str,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<String, SeedbotError>
    where
        F: FnMut(AgentEvent) + Send,
    {
        let log = self.history.get_or_create(session_id);
        let mut guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                on_event(AgentEvent::Cancelled);
                return Err(SeedbotError::Cancelled);
            }
            guard = log.lock() => guard,
        };

        let mut messages: Vec<ChatMessage> = guard.turns().iter().map(ChatMessage::from).collect();
        messages.push(ChatMessage::user(user_text));
        tracing::debug!(
            session_id,
            prior_turns = guard.len(),
            "answering user turn"
        );

        let ctx = ToolContext {
            session_id: session_id.to_string(),
        };
        let limit = self.config.request_timeout;
        let outcome = {
            let run = self.run_tool_loop(&mut messages, &ctx, &mut on_event);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(SeedbotError::Cancelled),
                result = tokio::time::timeout(limit, run) => match result {
                    Ok(result) => result,
                    Err(_) => Err(SeedbotError::Timeout {
                        timeout_ms: limit.as_millis() as u64,
                    }),
                },
            }
        };

        match outcome {
            Ok((text, usage)) => {
                guard.push(Turn::user(user_text));
                guard.push(Turn::assistant(text.clone()));
                self.history.touch(session_id);
                on_event(AgentEvent::Usage(usage));
                on_event(AgentEvent::Done);
                Ok(text)
            }
            Err(SeedbotError::Cancelled) => {
                tracing::debug!(session_id, "turn cancelled");
                on_event(AgentEvent::Cancelled);
                Err(SeedbotError::Cancelled)
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "turn failed");
                on_event(AgentEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Invoke the model until it produces a final answer, executing any tool
    /// calls it requests in between. Tool traffic stays in `messages` only.
    async fn run_tool_loop<F>(
        &self,
        messages: &mut Vec<ChatMessage>,
        ctx: &ToolContext,
        on_event: &mut F,
    ) -> Result<(String, Usage), SeedbotError>
    where
        F: FnMut(AgentEvent) + Send,
    {
        let tools = self.registry.definitions();
        let system = if self.config.system_prompt.is_empty() {
            None
        } else {
            Some(self.config.system_prompt.clone())
        };
        let mut total_usage = Usage::default();

        for iteration in 0..self.config.max_tool_iterations {
            let mut request = ModelRequest {
                model: self.config.model.clone(),
                system: system.clone(),
                messages: std::mem::take(messages),
                tools: tools.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            let result = self.model.complete(&request).await;

            // Restore messages before propagating any error
            *messages = std::mem::take(&mut request.messages);

            let response = result?;
            total_usage.add(&response.usage);

            if !response.wants_tools() {
                tracing::debug!(iteration, "final answer");
                return Ok((response.text.unwrap_or_default(), total_usage));
            }

            messages.push(ChatMessage::Assistant {
                text: response.text.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            for call in response.tool_calls {
                on_event(AgentEvent::ToolStart {
                    name: call.name.clone(),
                    input: call.arguments.to_string(),
                });

                let output = match self
                    .registry
                    .execute(&call.name, call.arguments, ctx.clone())
                    .await
                {
                    Ok(output) => output,
                    Err(ToolError::Retrieval(e)) => return Err(SeedbotError::RetrievalUnavailable(e)),
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "tool call rejected");
                        ToolOutput::error(e.to_string())
                    }
                };

                on_event(AgentEvent::ToolEnd {
                    name: call.name,
                    output: ellipsize(&output.text, TOOL_OUTPUT_PREVIEW),
                    is_error: output.is_error,
                });

                messages.push(ChatMessage::ToolResult {
                    call_id: call.id,
                    content: output.text,
                    is_error: output.is_error,
                });
            }
        }

        Err(SeedbotError::MaxIterations {
            limit: self.config.max_tool_iterations,
        })
    }
}
