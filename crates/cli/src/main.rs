//! ragdoc CLI
//!
//! Main entry point for the ragdoc command-line tool.
//! Builds a document index and answers questions grounded in it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ChatCommand, EvalCommand, PopulateCommand, QueryCommand, ResetCommand, StatsCommand,
};
use ragdoc_core::logging::{self, LogFormat};
use ragdoc_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// ragdoc - question answering over local documents
#[derive(Parser, Debug)]
#[command(name = "ragdoc")]
#[command(about = "Question answering over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGDOC_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format (text, json)
    #[arg(long, global = true, env = "RAGDOC_LOG_FORMAT")]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, mock)
    #[arg(short, long, global = true, env = "RAGDOC_PROVIDER")]
    provider: Option<String>,

    /// Answering model identifier
    #[arg(short, long, global = true, env = "RAGDOC_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index the documents directory
    Populate(PopulateCommand),

    /// Answer a question from the indexed documents
    Query(QueryCommand),

    /// Answer a question, printing a JSON reply
    Chat(ChatCommand),

    /// Grade answers against an evaluation suite
    Eval(EvalCommand),

    /// Show vector store statistics
    Stats(StatsCommand),

    /// Delete everything in the vector store
    Reset(ResetCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let mut config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        LogFormat::parse(&config.log_format),
    )?;

    tracing::info!("ragdoc starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.llm.provider, config.llm.model);
    tracing::debug!("Store: {:?}", config.store_path());

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Populate(_) => "populate",
        Commands::Query(_) => "query",
        Commands::Chat(_) => "chat",
        Commands::Eval(_) => "eval",
        Commands::Stats(_) => "stats",
        Commands::Reset(_) => "reset",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Populate(cmd) => cmd.execute(&config).await,
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config),
        Commands::Reset(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query() {
        let cli = Cli::try_parse_from(["ragdoc", "-p", "mock", "query", "Apa itu hukum pidana?"])
            .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("mock"));
        match cli.command {
            Commands::Query(cmd) => assert_eq!(cmd.question, "Apa itu hukum pidana?"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_populate_reset() {
        let cli = Cli::try_parse_from(["ragdoc", "populate", "--reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Populate(PopulateCommand { reset: true, .. })));
    }
}
