//! Shared fakes and end-to-end pipeline scenarios.


use crate::embeddings::providers::HashProvider;
use crate::embeddings::EmbeddingProvider;
use crate::store::{SqliteStore, VectorStore};
use crate::types::{RetrievalResult, StoreStats, VectorStoreEntry};
use ragdoc_core::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

/// Hash embeddings that count provider calls and can start failing.
#[derive(Debug)]
pub(crate) struct CountingProvider {
    inner: HashProvider,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl CountingProvider {
    pub(crate) fn new(dimensions: usize) -> Self {
        Self {
            inner: HashProvider::new(dimensions),
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Succeed for the first `n` batches, then fail every call.
    pub(crate) fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingProvider {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(AppError::Embedding("embedding backend unreachable".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

/// SQLite store that records which thread served each call.
pub(crate) struct ThreadRecordingStore {
    inner: SqliteStore,
    threads: Mutex<Vec<ThreadId>>,
}

impl ThreadRecordingStore {
    pub(crate) fn open(path: &Path) -> AppResult<Self> {
        Ok(Self {
            inner: SqliteStore::open(path)?,
            threads: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn record(&self) {
        if let Ok(mut threads) = self.threads.lock() {
            threads.push(thread::current().id());
        }
    }
}

impl VectorStore for ThreadRecordingStore {
    fn upsert(&self, entries: &[VectorStoreEntry]) -> AppResult<usize> {
        self.record();
        self.inner.upsert(entries)
    }

    fn existing_ids(&self) -> AppResult<HashSet<String>> {
        self.record();
        self.inner.existing_ids()
    }

    fn fingerprints(&self) -> AppResult<HashMap<String, String>> {
        self.record();
        self.inner.fingerprints()
    }

    fn ids_for_source(&self, source_id: &str) -> AppResult<Vec<String>> {
        self.record();
        self.inner.ids_for_source(source_id)
    }

    fn delete(&self, ids: &[String]) -> AppResult<usize> {
        self.record();
        self.inner.delete(ids)
    }

    fn similarity_search(&self, query: &[f32], k: usize) -> AppResult<Vec<RetrievalResult>> {
        self.record();
        self.inner.similarity_search(query, k)
    }

    fn stats(&self) -> AppResult<StoreStats> {
        self.record();
        self.inner.stats()
    }

    fn reset(&self) -> AppResult<()> {
        self.record();
        self.inner.reset()
    }
}
