//! OpenAI Chat Completions HTTP client.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use seedbot_types::ApiError;

use crate::retry::RetryConfig;
use crate::wire::{ChatCompletionRequest, ChatCompletionResponse};

/// The default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Client for the Chat Completions endpoint.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    retry_config: RetryConfig,
    request_timeout: Option<Duration>,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
            request_timeout: None,
        })
    }

    /// Set the retry configuration for transient errors (429, 5xx, network).
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Bound each HTTP attempt. Expiry surfaces as [`ApiError::Timeout`].
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat completion request, retrying transient failures.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let headers = self.headers()?;
        let body = serde_json::to_string(request).map_err(|e| ApiError::BadRequest {
            message: format!("Failed to serialize request: {e}"),
        })?;

        let attempts = self.retry_config.attempts();
        let mut attempt = 0;
        loop {
            tracing::debug!("POST {url} (attempt {}/{attempts})", attempt + 1);

            let err = match self.send_once(&url, &headers, &body).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_transient() || attempt + 1 >= attempts {
                return Err(err);
            }

            let delay = self.retry_config.delay_for(attempt, err.retry_after_ms());
            tracing::warn!(
                "Retryable API error (attempt {}/{attempts}): {err}. Retrying in {}ms...",
                attempt + 1,
                delay.as_millis(),
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &str,
    ) -> Result<ChatCompletionResponse, ApiError> {
        let mut builder = self
            .http
            .post(url)
            .headers(headers.clone())
            .body(body.to_string());
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text, retry_after));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                ApiError::Auth {
                    message: "Invalid API key format".into(),
                }
            })?,
        );
        Ok(headers)
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| *secs >= 0.0)
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed ApiError.
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ApiError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => ApiError::Auth { message },
        400 | 404 | 422 => ApiError::BadRequest { message },
        408 => ApiError::Timeout,
        429 => ApiError::RateLimited {
            retry_after_ms: retry_after,
        },
        _ => ApiError::Server { status, message },
    }
}
