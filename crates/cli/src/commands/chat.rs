//! Chat command handler.
//!
//! Prints `{"response": ...}` or `{"error": ...}`; pipeline failures are
//! reported in the payload rather than through the exit status.

use clap::Args;
use ragdoc_core::{config::AppConfig, AppResult};
use ragdoc_knowledge::ChatReply;

/// Answer a question, printing a JSON reply
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The question to ask
    pub question: String,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let reply = self.reply(config).await;
        println!("{}", serde_json::to_string(&reply)?);
        Ok(())
    }

    async fn reply(&self, config: &AppConfig) -> ChatReply {
        let pipeline = super::require_question(&self.question)
            .and_then(|_| super::query_pipeline(config, None));

        match pipeline {
            Ok(pipeline) => pipeline.chat(&self.question).await,
            Err(e) => ChatReply::Error {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_blank_question_replies_with_error_without_io() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = dir.path().to_path_buf();

        let cmd = ChatCommand {
            question: "".to_string(),
        };

        match cmd.reply(&config).await {
            ChatReply::Error { error } => assert!(error.contains("empty")),
            other => panic!("expected error reply, got {:?}", other),
        }
        assert!(!config.ragdoc_dir().exists());
    }
}
