//! Question to top-k chunks, and chunks to a grounded prompt.

use crate::embeddings::Embedder;
use crate::store::{self, VectorStore};
use crate::types::RetrievalResult;
use ragdoc_core::{AppError, AppResult};
use ragdoc_prompt::PromptAssembler;
use std::sync::Arc;

/// Embeds a question and searches the store.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Embedder,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Embedder) -> Self {
        Self { store, embedder }
    }

    /// The `k` chunks most similar to `question`, most relevant first.
    ///
    /// An empty question or `k == 0` fails before anything is embedded.
    #[tracing::instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn retrieve(&self, question: &str, k: usize) -> AppResult<Vec<RetrievalResult>> {
        if question.trim().is_empty() {
            return Err(AppError::Input("Question cannot be empty".to_string()));
        }
        if k == 0 {
            return Err(AppError::Input("k must be at least 1".to_string()));
        }

        let query = self.embedder.embed(question).await?;
        let results =
            store::blocking(&self.store, move |s| s.similarity_search(&query, k)).await?;

        if results.is_empty() {
            tracing::warn!("No chunks in the store; answering without context");
        }

        Ok(results)
    }
}

/// Render the answer prompt over `results` in retrieval order.
pub fn assemble(
    prompts: &PromptAssembler,
    question: &str,
    results: &[RetrievalResult],
) -> AppResult<String> {
    prompts.answer_prompt(question, results.iter().map(|r| r.entry.text.as_str()))
}
