//! Generator: the bounded, time-limited front door to a language model.
//!
//! `Generator` owns a client handle, a fixed model id and a semaphore that
//! acts as the worker pool. Every call gets an explicit timeout; expiry is a
//! `Generation` error and leaves nothing behind, since generation has no
//! side effects to undo.

use crate::client::{LlmClient, LlmRequest};
use ragdoc_core::config::LlmSettings;
use ragdoc_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

/// Default per-call timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of concurrent calls against one model instance.
const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Initial backoff between retries, doubled per attempt.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Language model invoker with a fixed model identifier.
#[derive(Clone)]
pub struct Generator {
    client: Arc<dyn LlmClient>,
    model: String,
    timeout: Duration,
    max_retries: u32,
    temperature: Option<f32>,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Generator {
    /// Create a generator with default timeout, no retries and a pool of two.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            temperature: None,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
        }
    }

    /// Create a generator for `model` using the limits in the `llm` section.
    pub fn from_settings(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        settings: &LlmSettings,
    ) -> Self {
        let mut generator = Self::new(client, model)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_retries(settings.max_retries)
            .with_max_concurrent(settings.max_concurrent);
        generator.temperature = settings.temperature;
        generator
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry failed calls up to `max_retries` times with exponential backoff.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Bound concurrent calls. Clones made before this call keep the old pool.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Model identifier used for every call.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls currently allowed to start without waiting.
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run the model on `prompt` and return the generated text.
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Generation("Generator worker pool closed".to_string()))?;

        let mut request = LlmRequest::new(prompt, &self.model);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let mut attempt = 0u32;
        loop {
            match tokio::time::timeout(self.timeout, self.client.complete(&request)).await {
                Ok(Ok(response)) => {
                    debug!(
                        completion_tokens = response.usage.completion_tokens,
                        "Generation finished"
                    );
                    return Ok(response.content);
                }
                Ok(Err(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Generation failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.max_retries + 1,
                        backoff_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Ok(Err(e)) => return Err(self.wrap(e)),
                Err(_) => {
                    return Err(AppError::Generation(format!(
                        "model '{}' timed out after {:.1}s",
                        self.model,
                        self.timeout.as_secs_f64()
                    )))
                }
            }
        }
    }

    fn wrap(&self, err: AppError) -> AppError {
        match err {
            AppError::Generation(msg) => {
                AppError::Generation(format!("model '{}': {}", self.model, msg))
            }
            other => AppError::Generation(format!("model '{}': {}", self.model, other)),
        }
    }
}
