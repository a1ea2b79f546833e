//! Populate command handler.
//!
//! Loads the documents directory, chunks and embeds it into the store.

use clap::Args;
use ragdoc_core::{config::AppConfig, AppResult};
use ragdoc_knowledge::{store, Chunker, Embedder, Indexer, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Index the documents directory
#[derive(Args, Debug)]
pub struct PopulateCommand {
    /// Clear the store before indexing
    #[arg(long)]
    pub reset: bool,

    /// Documents directory (default: index.documents from config)
    #[arg(long)]
    pub documents: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PopulateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing populate command");
        tracing::debug!("Populate options: {:?}", self);

        let vectors: Arc<dyn VectorStore> = super::open_store(config)?;
        if self.reset {
            tracing::info!("Clearing store before indexing");
            store::blocking(&vectors, |s| s.reset()).await?;
        }

        let documents = self
            .documents
            .clone()
            .unwrap_or_else(|| config.documents_dir());

        let indexer = Indexer::new(
            vectors,
            Embedder::from_config(&config.embedding)?,
            Chunker::from_settings(&config.index)?,
        )
        .with_batch_size(config.embedding.batch_size);

        let report = indexer.index_dir(&documents).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.is_noop() {
            println!("No new documents to add");
        } else {
            println!(
                "Indexed {} documents: {} added, {} updated, {} unchanged, {} removed",
                report.documents, report.added, report.updated, report.skipped, report.removed
            );
        }

        Ok(())
    }
}
