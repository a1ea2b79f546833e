//! LLM provider factory.
//!
//! Builds an LLM client from the configured provider name. The result is an
//! explicit handle that callers pass into each pipeline stage.

use crate::client::LlmClient;
use crate::providers::{MockClient, OllamaClient};
use ragdoc_core::config::LlmSettings;
use ragdoc_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout` - Optional HTTP timeout for network providers
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, or
/// `AppError::Generation` if the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(crate::providers::ollama::DEFAULT_OLLAMA_URL);
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockClient::echo())),
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

/// Create the client described by the `llm` config section.
pub fn create_client_from_settings(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    create_client(
        &settings.provider,
        Some(&settings.endpoint),
        Some(Duration::from_secs(settings.timeout_secs)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            "ollama",
            Some("http://localhost:8080"),
            Some(Duration::from_secs(5)),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_mock_client() {
        let client = create_client("MOCK", None, None).unwrap();
        assert_eq!(client.provider_name(), "mock");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_from_settings() {
        let client = create_client_from_settings(&LlmSettings::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }
}
