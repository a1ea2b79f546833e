//! LLM integration crate for ragdoc.
//!
//! Provider-agnostic access to language models. Pipelines receive an
//! explicit [`Generator`] built around an [`LlmClient`] rather than reaching
//! for a process-wide model handle.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Mock**: Scripted replies for tests and offline runs
//!
//! # Example
//! ```no_run
//! use ragdoc_llm::{Generator, OllamaClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = Generator::new(Arc::new(OllamaClient::new()), "llama3.2:1b");
//! let answer = generator.generate("Hello, world!").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod generator;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_from_settings};
pub use generator::Generator;
pub use providers::{MockClient, OllamaClient};
