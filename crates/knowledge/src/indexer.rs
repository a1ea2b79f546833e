//! Ingestion: chunk, diff against the store, embed what is new, upsert.

use crate::chunker::Chunker;
use crate::embeddings::Embedder;
use crate::loader;
use crate::store::{self, VectorStore};
use crate::types::{Chunk, Document, IndexReport, VectorStoreEntry};
use ragdoc_core::{AppError, AppResult};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Builds and refreshes the vector index from documents.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Embedder,
    chunker: Chunker,
    batch_size: usize,
}

struct Pending {
    chunk: Chunk,
    replaces: bool,
}

impl Indexer {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Embedder, chunker: Chunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
            batch_size: 64,
        }
    }

    /// Embed and upsert at most `batch_size` chunks at a time.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load every document under `root` and index it.
    pub async fn index_dir(&self, root: &Path) -> AppResult<IndexReport> {
        let documents = loader::load_dir(root)?;
        self.index(&documents).await
    }

    /// Index `documents`.
    ///
    /// Chunks whose id and content hash are already stored are skipped without
    /// embedding. Each batch is all or nothing; a failed batch leaves earlier
    /// batches committed.
    pub async fn index(&self, documents: &[Document]) -> AppResult<IndexReport> {
        let start = Instant::now();

        let mut sources = HashSet::new();
        for document in documents {
            document.validate()?;
            if !sources.insert(document.source_id.as_str()) {
                return Err(AppError::Input(format!(
                    "Duplicate document source id: {}",
                    document.source_id
                )));
            }
        }

        let fingerprints = store::blocking(&self.store, |s| s.fingerprints()).await?;
        let mut report = IndexReport {
            documents: documents.len(),
            ..Default::default()
        };
        let mut pending = Vec::new();
        let mut stale = Vec::new();

        for document in documents {
            let chunks = self.chunker.chunk(document)?;
            let current: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();

            let source_id = document.source_id.clone();
            let stored =
                store::blocking(&self.store, move |s| s.ids_for_source(&source_id)).await?;
            for id in stored {
                if !current.contains(id.as_str()) {
                    stale.push(id);
                }
            }

            for chunk in chunks {
                match fingerprints.get(&chunk.id) {
                    Some(hash) if *hash == chunk.content_hash => report.skipped += 1,
                    Some(_) => pending.push(Pending {
                        chunk,
                        replaces: true,
                    }),
                    None => pending.push(Pending {
                        chunk,
                        replaces: false,
                    }),
                }
            }
        }

        tracing::info!(
            "Indexing {} documents: {} chunks to embed, {} unchanged",
            documents.len(),
            pending.len(),
            report.skipped
        );

        for (n, batch) in pending.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|p| p.chunk.text.clone()).collect();
            let vectors = self.embedder.embed_many(&texts).await?;

            let entries = batch
                .iter()
                .zip(vectors)
                .map(|(p, vector)| VectorStoreEntry::try_from(p.chunk.clone().with_vector(vector)))
                .collect::<AppResult<Vec<_>>>()?;
            store::blocking(&self.store, move |s| s.upsert(&entries)).await?;

            let replaced = batch.iter().filter(|p| p.replaces).count();
            report.updated += replaced;
            report.added += batch.len() - replaced;

            tracing::debug!("Committed batch {} ({} chunks)", n + 1, batch.len());
        }

        if !stale.is_empty() {
            report.removed = store::blocking(&self.store, move |s| s.delete(&stale)).await?;
        }

        tracing::info!(
            "Indexing finished in {:.2}s: {} added, {} updated, {} skipped, {} removed",
            start.elapsed().as_secs_f64(),
            report.added,
            report.updated,
            report.skipped,
            report.removed
        );

        Ok(report)
    }
}
