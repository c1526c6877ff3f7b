//! [`LanguageModel`] implementation backed by the Chat Completions API.

use crate::client::ApiClient;
use crate::retry::RetryConfig;
use crate::wire::ChatCompletionRequest;
use seedbot_types::{ApiError, LanguageModel, ModelRequest, ModelResponse};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// OpenAI chat model with function-style tool calling.
///
/// Retries live in [`ApiClient`]; this type only translates requests.
#[derive(Clone)]
pub struct OpenAiModel {
    client: ApiClient,
}

impl OpenAiModel {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url)?,
        })
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.client = self.client.with_retry_config(config);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_request_timeout(timeout);
        self
    }
}

impl LanguageModel for OpenAiModel {
    fn complete<'a>(
        &'a self,
        request: &'a ModelRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ModelResponse, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let wire = ChatCompletionRequest::from_model_request(request);
            let response = self.client.chat_completion(&wire).await?;
            let response = response.into_model_response()?;
            tracing::debug!(
                tool_calls = response.tool_calls.len(),
                finish_reason = ?response.finish_reason,
                "model responded"
            );
            Ok(response)
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_model_new() {
        assert!(OpenAiModel::new("sk-test", "https://api.example.com").is_ok());
    }

    #[test]
    fn openai_model_name() {
        let model = OpenAiModel::new("sk-test", "https://api.example.com")
            .unwrap()
            .with_retry_config(RetryConfig::none())
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(model.name(), "openai");
    }
}
