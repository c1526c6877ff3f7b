//! Pinecone vector index retriever.
//!
//! Embeds the query locally and calls the index data-plane endpoint
//! `POST {host}/query`. Chunk text is stored in match metadata under `text`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use seedbot_types::{Passage, RetrievalError, Retriever};
use serde::{Deserialize, Serialize};

use crate::embedder::Embedder;
use crate::{DEFAULT_TOP_K, map_transport_error};

const METADATA_TEXT_KEY: &str = "text";

pub struct PineconeRetriever {
    http: reqwest::Client,
    host: String,
    api_key: String,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    namespace: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl PineconeRetriever {
    /// `host` is the index host, with or without a scheme
    /// (e.g. `seedworld-whitepaper-rag-abc123.svc.us-east-1.pinecone.io`).
    pub fn new(
        host: impl Into<String>,
        api_key: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(map_transport_error)?;
        Ok(Self {
            http,
            host: normalize_host(&host.into()),
            api_key: api_key.into(),
            embedder,
            top_k: DEFAULT_TOP_K,
            namespace: None,
        })
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    async fn query(&self, vector: &[f32]) -> Result<Vec<Passage>, RetrievalError> {
        let response = self
            .http
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&QueryRequest {
                vector,
                top_k: self.top_k,
                include_metadata: true,
                namespace: self.namespace.as_deref(),
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

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;
        Ok(passages_from_matches(body.matches))
    }
}

impl Retriever for PineconeRetriever {
    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Passage>, RetrievalError>> + Send + 'a>> {
        Box::pin(async move {
            let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
            let Some(vector) = vectors.pop() else {
                return Err(RetrievalError::MalformedResponse(
                    "embedder returned no vector for query".into(),
                ));
            };
            let passages = self.query(&vector).await?;
            tracing::debug!(host = %self.host, hits = passages.len(), "pinecone query");
            Ok(passages)
        })
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Matches without text metadata are skipped.
fn passages_from_matches(matches: Vec<QueryMatch>) -> Vec<Passage> {
    let mut passages: Vec<Passage> = matches
        .into_iter()
        .filter_map(|m| {
            let text = m.metadata?.get(METADATA_TEXT_KEY)?.as_str()?.to_string();
            Some(Passage::new(text, m.score))
        })
        .collect();
    passages.sort_by(|a, b| b.score.total_cmp(&a.score));
    passages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_gets_https_scheme() {
        assert_eq!(
            normalize_host("idx-abc.svc.pinecone.io/"),
            "https://idx-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
    }

    #[test]
    fn query_request_uses_camel_case() {
        let body = serde_json::to_value(QueryRequest {
            vector: &[0.5, 0.25],
            top_k: 4,
            include_metadata: true,
            namespace: None,
        })
        .unwrap();
        assert_eq!(body["topK"], 4);
        assert_eq!(body["includeMetadata"], true);
        assert!(body.get("namespace").is_none());
    }

    #[test]
    fn matches_map_to_sorted_passages() {
        let body: QueryResponse = serde_json::from_str(
            r#"{"matches":[
                {"id":"a","score":0.5,"metadata":{"text":"Seeds are the native token."}},
                {"id":"b","score":0.9,"metadata":{"text":"Seedworld is built on Roblox tech."}},
                {"id":"c","score":0.7},
                {"id":"d","score":0.6,"metadata":{"source":"whitepaper.pdf"}}
            ],"namespace":""}"#,
        )
        .unwrap();
        let passages = passages_from_matches(body.matches);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].text, "Seedworld is built on Roblox tech.");
        assert_eq!(passages[1].score, 0.5);
    }

    #[test]
    fn missing_matches_is_empty() {
        let body: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(passages_from_matches(body.matches).is_empty());
    }
}
