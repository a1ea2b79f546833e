//! Command handlers for the ragdoc CLI.
//!
//! Each subcommand lives in its own module. The helpers below wire the
//! pipeline components from configuration so every command builds them
//! the same way.

pub mod chat;
pub mod eval;
pub mod populate;
pub mod query;
pub mod reset;
pub mod stats;

pub use chat::ChatCommand;
pub use eval::EvalCommand;
pub use populate::PopulateCommand;
pub use query::QueryCommand;
pub use reset::ResetCommand;
pub use stats::StatsCommand;

use ragdoc_core::{config::AppConfig, AppError, AppResult};
use ragdoc_knowledge::{Embedder, QueryPipeline, Retriever, SqliteStore};
use ragdoc_llm::{create_client_from_settings, Generator};
use ragdoc_prompt::PromptAssembler;
use std::sync::Arc;

pub(crate) fn open_store(config: &AppConfig) -> AppResult<Arc<SqliteStore>> {
    config.ensure_ragdoc_dir()?;
    Ok(Arc::new(SqliteStore::open(&config.store_path())?))
}

/// Reject a blank question before anything touches the disk.
pub(crate) fn require_question(question: &str) -> AppResult<()> {
    if question.trim().is_empty() {
        return Err(AppError::Input("Question cannot be empty".to_string()));
    }
    Ok(())
}

pub(crate) fn prompts(config: &AppConfig) -> AppResult<PromptAssembler> {
    PromptAssembler::from_dir(&config.prompts_dir())
}

/// Generator for `model` using the configured provider and limits.
pub(crate) fn generator(config: &AppConfig, model: &str) -> AppResult<Generator> {
    let client = create_client_from_settings(&config.llm)?;
    Ok(Generator::from_settings(client, model, &config.llm))
}

pub(crate) fn query_pipeline(config: &AppConfig, top_k: Option<usize>) -> AppResult<QueryPipeline> {
    let store = open_store(config)?;
    let embedder = Embedder::from_config(&config.embedding)?;

    Ok(QueryPipeline::new(
        Retriever::new(store, embedder),
        prompts(config)?,
        generator(config, &config.llm.model)?,
    )
    .with_top_k(top_k.unwrap_or(config.retrieval.top_k)))
}
