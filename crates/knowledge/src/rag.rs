//! Query pipeline: embed, retrieve, assemble, generate.

use crate::retriever::{assemble, Retriever};
use ragdoc_core::{AppError, AppResult};
use ragdoc_llm::Generator;
use ragdoc_prompt::PromptAssembler;
use serde::{Deserialize, Serialize};

/// A grounded answer with the ids of the chunks it was conditioned on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    pub text: String,
    /// Chunk ids in retrieval order
    pub sources: Vec<String>,
}

impl RagResponse {
    /// Console rendering: `Response: <text>` then `Sources: [<id>, ...]`.
    pub fn render(&self) -> String {
        format!(
            "Response: {}\nSources: [{}]",
            self.text,
            self.sources.join(", ")
        )
    }
}

/// Reply for the chat surface: exactly one of `response` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    Response { response: String },
    Error { error: String },
}

/// Stateless question answering over the vector store.
pub struct QueryPipeline {
    retriever: Retriever,
    prompts: PromptAssembler,
    generator: Generator,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(retriever: Retriever, prompts: PromptAssembler, generator: Generator) -> Self {
        Self {
            retriever,
            prompts,
            generator,
            top_k: 5,
        }
    }

    /// Number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Answer `question` from the indexed corpus.
    #[tracing::instrument(skip(self, question), fields(top_k = self.top_k))]
    pub async fn query(&self, question: &str) -> AppResult<RagResponse> {
        if question.trim().is_empty() {
            return Err(AppError::Input("Question cannot be empty".to_string()));
        }

        let results = self.retriever.retrieve(question, self.top_k).await?;
        let prompt = assemble(&self.prompts, question, &results)?;
        let text = self.generator.generate(&prompt).await?;

        let sources = results.into_iter().map(|r| r.entry.id).collect();
        Ok(RagResponse { text, sources })
    }

    /// Answer `question`, folding any failure into the reply.
    pub async fn chat(&self, question: &str) -> ChatReply {
        match self.query(question).await {
            Ok(response) => ChatReply::Response {
                response: response.text,
            },
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                ChatReply::Error {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let response = RagResponse {
            text: "Tiga komponen.".to_string(),
            sources: vec!["a.pdf:0:0".to_string(), "a.pdf:1:2".to_string()],
        };
        assert_eq!(
            response.render(),
            "Response: Tiga komponen.\nSources: [a.pdf:0:0, a.pdf:1:2]"
        );
    }

    #[test]
    fn test_chat_reply_shape() {
        let ok = serde_json::to_value(ChatReply::Response {
            response: "jawaban".to_string(),
        })
        .unwrap();
        assert_eq!(ok, serde_json::json!({"response": "jawaban"}));

        let err = serde_json::to_value(ChatReply::Error {
            error: "gagal".to_string(),
        })
        .unwrap();
        assert_eq!(err, serde_json::json!({"error": "gagal"}));
    }
}
