//! Types for documents, chunks and the vector store.

use ragdoc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A loaded source document: one entry per page of extracted text.
///
/// Non-paginated formats have a single page, numbered 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path of the document as discovered under the corpus root
    pub source_id: String,
    /// Page texts, indexed by page number
    pub pages: Vec<String>,
}

impl Document {
    /// Create a paginated document.
    pub fn new(source_id: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            source_id: source_id.into(),
            pages,
        }
    }

    /// Create a single-page document.
    pub fn single(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(source_id, vec![text.into()])
    }

    /// Reject documents that cannot produce stable chunk ids.
    pub fn validate(&self) -> AppResult<()> {
        if self.source_id.trim().is_empty() {
            return Err(AppError::Input(
                "Document source id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A segment of one page of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `"<source_id>:<page>:<chunk_index>"`
    pub id: String,
    pub source_id: String,
    pub page: u32,
    /// Position within the page, restarting at 0 per page
    pub chunk_index: u32,
    pub text: String,
    /// SHA-256 of `text`, hex encoded
    pub content_hash: String,
    /// Set once embedded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl Chunk {
    /// Create an un-embedded chunk.
    pub fn new(source_id: &str, page: u32, chunk_index: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: chunk_id(source_id, page, chunk_index),
            source_id: source_id.to_string(),
            page,
            chunk_index,
            content_hash: content_hash(&text),
            text,
            vector: None,
        }
    }

    /// Attach an embedding.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }
}

/// Build the stable identifier of a chunk.
pub fn chunk_id(source_id: &str, page: u32, chunk_index: u32) -> String {
    format!("{}:{}:{}", source_id, page, chunk_index)
}

/// Calculate SHA-256 hash of text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A chunk as persisted in the vector store. The vector is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreEntry {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub source_id: String,
    pub page: u32,
    pub chunk_index: u32,
    pub content_hash: String,
}

impl TryFrom<Chunk> for VectorStoreEntry {
    type Error = AppError;

    fn try_from(chunk: Chunk) -> AppResult<Self> {
        let vector = chunk
            .vector
            .ok_or_else(|| AppError::Input(format!("Chunk {} has no vector", chunk.id)))?;

        Ok(Self {
            id: chunk.id,
            text: chunk.text,
            vector,
            source_id: chunk.source_id,
            page: chunk.page,
            chunk_index: chunk.chunk_index,
            content_hash: chunk.content_hash,
        })
    }
}

/// One search hit. `score` is cosine similarity, higher is more relevant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub entry: VectorStoreEntry,
    pub score: f32,
}

/// Outcome of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Documents processed
    pub documents: usize,
    /// Chunks embedded for the first time
    pub added: usize,
    /// Chunks re-embedded because their text changed
    pub updated: usize,
    /// Chunks already present with identical text
    pub skipped: usize,
    /// Chunks dropped because their document no longer produces them
    pub removed: usize,
}

impl IndexReport {
    /// Whether the run wrote anything.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Summary of store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub sources: usize,
    /// Fixed by the first upsert; `None` while the store is empty
    pub dimensions: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_stable() {
        let a = Chunk::new("data/kuhp.pdf", 3, 1, "Pasal 1");
        let b = Chunk::new("data/kuhp.pdf", 3, 1, "Pasal 1");
        assert_eq!(a.id, "data/kuhp.pdf:3:1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_hash() {
        let hash = content_hash("Hello, world!");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash("Hello, world!"));
        assert_ne!(hash, content_hash("Different text"));
    }

    #[test]
    fn test_entry_requires_vector() {
        let chunk = Chunk::new("doc.txt", 0, 0, "text");
        assert!(matches!(
            VectorStoreEntry::try_from(chunk.clone()),
            Err(AppError::Input(_))
        ));

        let entry = VectorStoreEntry::try_from(chunk.with_vector(vec![0.5, 0.5])).unwrap();
        assert_eq!(entry.id, "doc.txt:0:0");
        assert_eq!(entry.vector, vec![0.5, 0.5]);
    }

    #[test]
    fn test_document_validation() {
        assert!(Document::single("", "text").validate().is_err());
        assert!(Document::single("  ", "text").validate().is_err());
        assert!(Document::single("a.txt", "").validate().is_ok());
    }
}
