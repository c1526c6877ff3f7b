//! Text embedding trait and the OpenAI embeddings client.

use seedbot_types::RetrievalError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::map_transport_error;

/// The default OpenAI embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Inputs per embeddings request.
const BATCH_SIZE: usize = 100;

/// Turns text into dense vectors.
pub trait Embedder: Send + Sync {
    /// Embed `texts`, returning one vector per input in the same order.
    fn embed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send + 'a>>;

    fn model(&self) -> &str;
}

/// Client for `POST /v1/embeddings`.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(map_transport_error)?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let response = self
            .http
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: batch,
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;
        if body.data.len() != batch.len() {
            return Err(RetrievalError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                body.data.len()
            )));
        }

        let mut data = body.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send + 'a>> {
        Box::pin(async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for batch in texts.chunks(BATCH_SIZE) {
                tracing::debug!(model = %self.model, inputs = batch.len(), "embedding batch");
                vectors.extend(self.embed_batch(batch).await?);
            }
            Ok(vectors)
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let input = vec!["hello".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: DEFAULT_EMBEDDING_MODEL,
            input: &input,
        })
        .unwrap();
        assert_eq!(body["model"], "text-embedding-ada-002");
        assert_eq!(body["input"][0], "hello");
    }

    #[tokio::test]
    async fn empty_input_makes_no_request() {
        // Unroutable base URL: any request would fail.
        let embedder = OpenAiEmbedder::new("sk-test", "http://127.0.0.1:9", "m").unwrap();
        let vectors = embedder.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
