//! Scripted LLM client for tests and offline runs.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ragdoc_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the mock does when its script runs dry.
#[derive(Debug, Clone)]
enum Fallback {
    /// Echo the prompt back
    Echo,
    /// Always return this text
    Fixed(String),
    /// Always fail with a generation error
    Fail(String),
}

/// Deterministic LLM client.
///
/// Replies come from a queue of scripted responses first, then from the
/// fallback (echo by default). Every call is counted and the prompts are
/// recorded so tests can assert whether the model was invoked at all.
#[derive(Debug)]
pub struct MockClient {
    script: Mutex<VecDeque<AppResult<String>>>,
    fallback: Fallback,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockClient {
    /// Mock that echoes every prompt.
    pub fn echo() -> Self {
        Self::with_fallback(Fallback::Echo)
    }

    /// Mock that always answers `text`.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::with_fallback(Fallback::Fixed(text.into()))
    }

    /// Mock whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_fallback(Fallback::Fail(message.into()))
    }

    fn with_fallback(fallback: Fallback) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue replies served before the fallback.
    pub fn with_script<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = AppResult<S>>,
        S: Into<String>,
    {
        if let Ok(mut script) = self.script.lock() {
            script.extend(replies.into_iter().map(|r| r.map(Into::into)));
        }
        self
    }

    /// Sleep before answering, to exercise timeouts and pooling.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, request: &LlmRequest) -> AppResult<String> {
        let scripted = self
            .script
            .lock()
            .map_err(|_| AppError::Generation("mock script lock poisoned".to_string()))?
            .pop_front();

        match scripted {
            Some(reply) => reply,
            None => match &self.fallback {
                Fallback::Echo => Ok(request.prompt.clone()),
                Fallback::Fixed(text) => Ok(text.clone()),
                Fallback::Fail(message) => Err(AppError::Generation(message.clone())),
            },
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = self.next_reply(request)?;
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let client = MockClient::fixed("done").with_script(vec![Ok("first"), Ok("second")]);
        let request = LlmRequest::new("prompt", "mock-model");

        assert_eq!(client.complete(&request).await.unwrap().content, "first");
        assert_eq!(client.complete(&request).await.unwrap().content, "second");
        assert_eq!(client.complete(&request).await.unwrap().content, "done");
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_echo_records_prompts() {
        let client = MockClient::echo();
        let response = client
            .complete(&LlmRequest::new("ping", "mock-model"))
            .await
            .unwrap();

        assert_eq!(response.content, "ping");
        assert_eq!(response.model, "mock-model");
        assert_eq!(client.prompts(), vec!["ping".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_client() {
        let client = MockClient::failing("model offline");
        let result = client.complete(&LlmRequest::new("x", "m")).await;
        assert!(matches!(result, Err(AppError::Generation(_))));
    }
}
