//! Embedding engine.
//!
//! [`Embedder`] wraps a provider with the limits every caller shares:
//! bounded concurrency, a per-batch timeout and input validation.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use ragdoc_core::config::EmbeddingSettings;
use ragdoc_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Provider handle with concurrency, timeout and length limits.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    max_input_chars: usize,
}

impl Embedder {
    /// Wrap `provider` with one permit, a 30s timeout and an 8192 char limit.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            permits: Arc::new(Semaphore::new(1)),
            timeout: Duration::from_secs(30),
            max_input_chars: 8192,
        }
    }

    /// Wrap `provider` with the limits in the `embedding` config section.
    pub fn from_settings(provider: Arc<dyn EmbeddingProvider>, settings: &EmbeddingSettings) -> Self {
        Self::new(provider)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_max_input_chars(settings.max_input_chars)
            .with_max_concurrent(settings.max_concurrent)
    }

    /// Build the configured provider and wrap it.
    pub fn from_config(settings: &EmbeddingSettings) -> AppResult<Self> {
        Ok(Self::from_settings(create_provider(settings)?, settings))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        self
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Permits currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Embed one text.
    pub async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    /// Embed `texts`, returning one vector per text in the same order.
    ///
    /// The batch holds a permit for its whole duration; the permit is
    /// released on success, error and timeout alike.
    pub async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                return Err(AppError::Embedding(format!(
                    "Cannot embed empty text at index {}",
                    i
                )));
            }
            let chars = text.chars().count();
            if chars > self.max_input_chars {
                return Err(AppError::Embedding(format!(
                    "Text at index {} has {} characters, limit is {}",
                    i, chars, self.max_input_chars
                )));
            }
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Embedding("Embedding pool closed".to_string()))?;

        tracing::debug!(
            "Embedding {} texts with provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let vectors = tokio::time::timeout(self.timeout, self.provider.embed_batch(texts))
            .await
            .map_err(|_| {
                AppError::Embedding(format!(
                    "Embedding batch of {} timed out after {:.1}s",
                    texts.len(),
                    self.timeout.as_secs_f64()
                ))
            })??;

        if vectors.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        Ok(vectors)
    }
}
