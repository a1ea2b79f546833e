//! Reset command handler.

use clap::Args;
use ragdoc_core::{config::AppConfig, AppError, AppResult};
use ragdoc_knowledge::VectorStore;

/// Delete everything in the vector store
#[derive(Args, Debug)]
pub struct ResetCommand {
    /// Confirm the deletion
    #[arg(short, long)]
    pub yes: bool,
}

impl ResetCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing reset command");

        if !self.yes {
            return Err(AppError::Input(
                "Refusing to clear the store without --yes".to_string(),
            ));
        }

        let store = super::open_store(config)?;
        let removed = store.stats()?.entries;
        store.reset()?;

        println!("Cleared {} chunks from {}", removed, store.path().display());
        Ok(())
    }
}
