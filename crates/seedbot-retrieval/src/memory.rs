//! In-memory vector index over a local corpus.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use seedbot_types::{Passage, RetrievalError, Retriever};

use crate::DEFAULT_TOP_K;
use crate::embedder::Embedder;
use crate::splitter::TextSplitter;

struct IndexedChunk {
    text: String,
    embedding: Vec<f32>,
}

/// Chunks embedded once at build time, ranked by cosine similarity per query.
pub struct InMemoryIndex {
    chunks: Vec<IndexedChunk>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl InMemoryIndex {
    /// Embed `texts` and build the index.
    pub async fn build(
        texts: Vec<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let embeddings = embedder.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(RetrievalError::MalformedResponse(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                texts.len()
            )));
        }

        let chunks: Vec<IndexedChunk> = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect();
        tracing::info!(
            chunks = chunks.len(),
            model = embedder.model(),
            "built in-memory index"
        );

        Ok(Self {
            chunks,
            embedder,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Read a text file, split it and build the index.
    pub async fn from_file(
        path: &Path,
        splitter: &TextSplitter,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RetrievalError::Corpus {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let texts = splitter.split(&raw);
        tracing::debug!(path = %path.display(), chunks = texts.len(), "split corpus");
        Self::build(texts, embedder).await
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn rank(&self, query: &[f32]) -> Vec<Passage> {
        let mut scored: Vec<Passage> = self
            .chunks
            .iter()
            .map(|chunk| {
                let score = cosine_similarity(query, &chunk.embedding);
                Passage::new(chunk.text.clone(), score)
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_k);
        scored
    }
}

impl Retriever for InMemoryIndex {
    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Passage>, RetrievalError>> + Send + 'a>> {
        Box::pin(async move {
            if self.chunks.is_empty() {
                return Ok(Vec::new());
            }
            let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
            let Some(vector) = vectors.pop() else {
                return Err(RetrievalError::MalformedResponse(
                    "embedder returned no vector for query".into(),
                ));
            };
            Ok(self.rank(&vector))
        })
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Cosine similarity of two vectors; 0.0 when either is zero or the
/// dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VOCAB: [&str; 4] = ["land", "token", "avatar", "order"];

    /// Bag-of-keywords embedder: one dimension per vocabulary word.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Embedder for KeywordEmbedder {
        fn embed<'a>(
            &'a self,
            texts: &'a [String],
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send + 'a>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(texts
                    .iter()
                    .map(|t| {
                        let lower = t.to_lowercase();
                        VOCAB
                            .iter()
                            .map(|w| lower.matches(w).count() as f32)
                            .collect()
                    })
                    .collect())
            })
        }

        fn model(&self) -> &str {
            "keywords"
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn ranks_most_similar_first() {
        let embedder = KeywordEmbedder::new();
        let index = InMemoryIndex::build(
            vec![
                "Avatars can be customized.".into(),
                "Land parcels are owned by players. Land is scarce.".into(),
                "The token powers the economy.".into(),
            ],
            embedder.clone(),
        )
        .await
        .unwrap()
        .with_top_k(2);

        let passages = index.search("who owns land?").await.unwrap();
        assert_eq!(passages.len(), 2);
        assert!(passages[0].text.starts_with("Land parcels"));
        assert!(passages[0].score >= passages[1].score);
        // One embed call at build time, one per query.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_index_returns_nothing() {
        let index = InMemoryIndex::build(Vec::new(), KeywordEmbedder::new())
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(index.search("land").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn from_file_splits_and_indexes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "Date,Category,Total_Sale\n2024-01-01,order land,10\n\n2024-01-02,avatar skin,20"
        )
        .unwrap();

        let splitter = TextSplitter::new(50, 0);
        let index = InMemoryIndex::from_file(file.path(), &splitter, KeywordEmbedder::new())
            .await
            .unwrap();
        assert_eq!(index.len(), 2);

        let passages = index.search("avatar").await.unwrap();
        assert!(passages[0].text.contains("avatar skin"));
    }

    #[tokio::test]
    async fn missing_corpus_is_corpus_error() {
        let splitter = TextSplitter::new(100, 0);
        let result = InMemoryIndex::from_file(
            Path::new("/nonexistent/order_details.csv"),
            &splitter,
            KeywordEmbedder::new(),
        )
        .await;
        match result {
            Err(RetrievalError::Corpus { path, .. }) => assert!(path.ends_with("order_details.csv")),
            Err(e) => panic!("expected Corpus, got {e:?}"),
            Ok(_) => panic!("expected error"),
        }
    }
}
