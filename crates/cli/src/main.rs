//! helperbot: the command-line entry point.
//!
//! Commands:
//! - `run`: watch the comment stream and answer triggers
//! - `doctor`: check configuration, credentials and backends
//! - `config`: print the default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "helperbot",
    about = "Answers Reddit comments that summon it, using an LLM with web tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.helperbot/config.toml)
    #[arg(short, long, global = true, env = "HELPERBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for triggers and post replies until interrupted
    Run,

    /// Diagnose configuration and connectivity
    Doctor,

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    match cli.command {
        Commands::Run => commands::run::run(cli.config.as_deref()).await?,
        Commands::Doctor => commands::doctor::run(cli.config.as_deref()).await?,
        Commands::Config => commands::config_cmd::print_default(),
    }

    Ok(())
}
