//! Stats command handler.

use clap::Args;
use ragdoc_core::{config::AppConfig, AppResult};
use ragdoc_knowledge::VectorStore;

/// Show vector store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = super::open_store(config)?;
        let stats = store.stats()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Store:      {}", store.path().display());
            println!("Chunks:     {}", stats.entries);
            println!("Sources:    {}", stats.sources);
            match stats.dimensions {
                Some(dims) => println!("Dimensions: {}", dims),
                None => println!("Dimensions: (not fixed yet)"),
            }
        }

        Ok(())
    }
}
