//! Query command handler.

use clap::Args;
use ragdoc_core::{config::AppConfig, AppResult};

/// Answer a question from the indexed documents
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (default: retrieval.topK from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");
        super::require_question(&self.question)?;

        let pipeline = super::query_pipeline(config, self.top_k)?;
        let response = pipeline.query(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            println!("{}", response.render());
        }

        Ok(())
    }
}
