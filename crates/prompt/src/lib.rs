//! Prompt system for ragdoc.
//!
//! This crate provides:
//! - Built-in grounded-answer and answer-equivalence templates
//! - YAML overrides from `.ragdoc/prompts/<id>.yml`
//! - Handlebars rendering with escaping disabled

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, join_context, PromptAssembler};
pub use builtin::{CONTEXT_SEPARATOR, EVAL_COMPARE_ID, RAG_ANSWER_ID};
pub use loader::{load_prompt, resolve_prompt};
pub use types::PromptDefinition;
