//! Configuration management for ragdoc.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.ragdoc/config.yaml`)
//! - Environment variables (`RAGDOC_*`)
//! - Command-line flags
//!
//! Later sources win. The configuration is workspace-centric: relative paths
//! for the documents directory and the vector store resolve against the
//! workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers the factory knows how to build.
pub const KNOWN_LLM_PROVIDERS: [&str; 2] = ["ollama", "mock"];

/// Embedding providers the factory knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "hash"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragdoc/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation model settings
    pub llm: LlmSettings,

    /// Embedding model settings
    pub embedding: EmbeddingSettings,

    /// Ingestion settings
    pub index: IndexSettings,

    /// Query settings
    pub retrieval: RetrievalSettings,

    /// Evaluator settings
    pub evaluation: EvaluationSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format ("text" or "json")
    pub log_format: String,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider name ("ollama" or "mock")
    pub provider: String,

    /// Base URL of the provider API
    pub endpoint: String,

    /// Model used to answer questions
    pub model: String,

    /// Model used by the evaluator to judge answers
    pub judge_model: String,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Retries for transport failures (0 disables retry)
    pub max_retries: u32,

    /// Maximum concurrent generation calls
    pub max_concurrent: usize,

    /// Optional sampling temperature
    pub temperature: Option<f32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:1b".to_string(),
            judge_model: "aya:8b".to_string(),
            timeout_secs: 120,
            max_retries: 0,
            max_concurrent: 2,
            temperature: None,
        }
    }
}

/// Embedding model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name ("ollama" or "hash")
    pub provider: String,

    /// Base URL of the provider API
    pub endpoint: String,

    /// Embedding model identifier
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Chunks embedded per flush unit during ingestion
    pub batch_size: usize,

    /// Longest input accepted, in characters
    pub max_input_chars: usize,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,

    /// Maximum concurrent embedding batches
    pub max_concurrent: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 64,
            max_input_chars: 8192,
            timeout_secs: 30,
            max_concurrent: 1,
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexSettings {
    /// Directory holding the source documents
    pub documents: PathBuf,

    /// SQLite file holding the vector store
    pub store: PathBuf,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            documents: PathBuf::from("data"),
            store: PathBuf::from(".ragdoc/store.sqlite"),
            chunk_size: 800,
            chunk_overlap: 80,
        }
    }
}

/// Query configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of chunks retrieved per question
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Evaluator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationSettings {
    /// Lowercase phrases that mark an answer as an "invalid question" deflection
    pub deflection_markers: Vec<String>,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            deflection_markers: vec![
                "tidak valid".to_string(),
                "pertanyaan tidak valid".to_string(),
                "invalid question".to_string(),
            ],
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    index: Option<IndexSettings>,
    retrieval: Option<RetrievalSettings>,
    evaluation: Option<EvaluationSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            index: IndexSettings::default(),
            retrieval: RetrievalSettings::default(),
            evaluation: EvaluationSettings::default(),
            log_level: None,
            log_format: "text".to_string(),
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `RAGDOC_WORKSPACE`: Override workspace path
    /// - `RAGDOC_CONFIG`: Path to config file
    /// - `RAGDOC_PROVIDER`: Generation provider
    /// - `RAGDOC_MODEL`: Generation model
    /// - `RAGDOC_JUDGE_MODEL`: Evaluator judge model
    /// - `RAGDOC_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RAGDOC_EMBEDDING_MODEL`: Embedding model
    /// - `RAGDOC_DOCUMENTS`: Documents directory
    /// - `RAGDOC_STORE`: Vector store file
    /// - `OLLAMA_URL`: Endpoint for both Ollama clients
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragdoc_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Store: {:?}", config.store_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, letting explicit paths win over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RAGDOC_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("RAGDOC_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.ragdoc_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env();

        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) {
        if let Ok(provider) = std::env::var("RAGDOC_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("RAGDOC_MODEL") {
            self.llm.model = model;
        }
        if let Ok(model) = std::env::var("RAGDOC_JUDGE_MODEL") {
            self.llm.judge_model = model;
        }
        if let Ok(provider) = std::env::var("RAGDOC_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Ok(model) = std::env::var("RAGDOC_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(endpoint) = std::env::var("OLLAMA_URL") {
            self.llm.endpoint = endpoint.clone();
            self.embedding.endpoint = endpoint;
        }
        if let Ok(documents) = std::env::var("RAGDOC_DOCUMENTS") {
            self.index.documents = PathBuf::from(documents);
        }
        if let Ok(store) = std::env::var("RAGDOC_STORE") {
            self.index.store = PathBuf::from(store);
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }
        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(index) = config_file.index {
            result.index = index;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(evaluation) = config_file.evaluation {
            result.evaluation = evaluation;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and the environment.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .ragdoc directory.
    pub fn ragdoc_dir(&self) -> PathBuf {
        self.workspace.join(".ragdoc")
    }

    /// Ensure the .ragdoc directory exists.
    pub fn ensure_ragdoc_dir(&self) -> AppResult<()> {
        let dir = self.ragdoc_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .ragdoc directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Directory holding the source documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.resolve(&self.index.documents)
    }

    /// Location of the vector store file.
    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.index.store)
    }

    /// Directory searched for prompt template overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.ragdoc_dir().join("prompts")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate the configuration before any pipeline is built.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.index.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }

        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }

        if self.index.chunk_size > self.embedding.max_input_chars {
            return Err(AppError::Config(format!(
                "chunkSize ({}) exceeds embedding maxInputChars ({})",
                self.index.chunk_size, self.embedding.max_input_chars
            )));
        }

        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding dimensions and batchSize must be positive".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be positive".to_string()));
        }

        if self.llm.max_concurrent == 0 || self.embedding.max_concurrent == 0 {
            return Err(AppError::Config(
                "maxConcurrent must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3.2:1b");
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.index.chunk_size, 800);
        assert_eq!(config.index.chunk_overlap, 80);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ragdoc_dir() {
        let config = AppConfig::default();
        assert!(config.ragdoc_dir().ends_with(".ragdoc"));
    }

    #[test]
    fn test_relative_paths_resolve_against_workspace() {
        let config = AppConfig {
            workspace: PathBuf::from("/srv/corpus"),
            ..Default::default()
        };
        assert_eq!(config.documents_dir(), PathBuf::from("/srv/corpus/data"));
        assert_eq!(
            config.store_path(),
            PathBuf::from("/srv/corpus/.ragdoc/store.sqlite")
        );
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("mock".to_string()),
            Some("llama3".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "mock");
        assert_eq!(overridden.llm.model, "llama3");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
index:
  chunkSize: 400
  chunkOverlap: 40
retrieval:
  topK: 3
logging:
  color: false
  format: json
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.index.chunk_size, 400);
        assert_eq!(merged.index.chunk_overlap, 40);
        // Unset fields keep their defaults
        assert_eq!(merged.index.documents, PathBuf::from("data"));
        assert_eq!(merged.retrieval.top_k, 3);
        assert!(merged.no_color);
        assert_eq!(merged.log_format, "json");
        assert_eq!(merged.llm, LlmSettings::default());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_must_be_smaller_than_size() {
        let mut config = AppConfig::default();
        config.index.chunk_overlap = config.index.chunk_size;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_chunk_size_exceeds_embedding_limit() {
        let mut config = AppConfig::default();
        config.index.chunk_size = 10_000;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.embedding.max_input_chars = 10_000;
        assert!(config.validate().is_ok());
    }
}
