//! Knowledge base: ingestion and retrieval for ragdoc.
//!
//! Documents are chunked per page, embedded and kept in a SQLite vector
//! store. Questions are answered by retrieving the closest chunks and
//! conditioning a language model on them.

pub mod chunker;
pub mod embeddings;
pub mod indexer;
pub mod loader;
pub mod rag;
pub mod retriever;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::Chunker;
pub use embeddings::{create_provider, Embedder, EmbeddingProvider};
pub use indexer::Indexer;
pub use rag::{ChatReply, QueryPipeline, RagResponse};
pub use retriever::{assemble, Retriever};
pub use store::{SqliteStore, VectorStore};
pub use types::{
    Chunk, Document, IndexReport, RetrievalResult, StoreStats, VectorStoreEntry,
};
