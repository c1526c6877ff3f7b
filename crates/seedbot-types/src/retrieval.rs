//! Retrieval trait and passage type.

use crate::RetrievalError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// A passage returned by a retriever with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub score: f32,
}

impl Passage {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// A searchable knowledge base.
///
/// Implementations return passages ranked by descending score.
pub trait Retriever: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Passage>, RetrievalError>> + Send + 'a>>;

    /// Backend name for logging (e.g., "pinecone").
    fn name(&self) -> &str;
}
