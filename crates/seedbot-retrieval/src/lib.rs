//! Embedding clients and vector retrievers for Seedbot knowledge bases.
//!
//! Two backends implement [`seedbot_types::Retriever`]:
//! - [`PineconeRetriever`] queries a hosted, pre-ingested Pinecone index.
//! - [`InMemoryIndex`] embeds a local corpus once and ranks chunks by cosine
//!   similarity.

mod embedder;
mod memory;
mod pinecone;
mod splitter;

pub use embedder::{DEFAULT_EMBEDDING_MODEL, Embedder, OpenAiEmbedder};
pub use memory::{InMemoryIndex, cosine_similarity};
pub use pinecone::PineconeRetriever;
pub use splitter::TextSplitter;

/// Passages returned per query unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 4;

pub(crate) fn map_transport_error(e: reqwest::Error) -> seedbot_types::RetrievalError {
    seedbot_types::RetrievalError::Unreachable(e.to_string())
}
