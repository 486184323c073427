//! Permix CLI — evaluate permission rules from the terminal.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use permix_config::PermixConfig;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "permix", version, about = "Check permissions against a Permix rule set")]
struct Cli {
    /// Config file with the schema and initial rules (overrides PERMIX_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check one or more actions on an entity; exits 1 when denied
    Check {
        entity: String,

        /// Action names, ANDed together. `all` checks every action
        #[arg(required = true)]
        actions: Vec<String>,

        /// JSON data passed to predicate rules
        #[arg(long)]
        data: Option<String>,

        /// Hydrate from a snapshot JSON file instead of the configured rules
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Print the configured rules as a JSON snapshot
    Snapshot,

    /// Validate a JSON rule file against the schema
    Validate { file: PathBuf },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = PermixConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(source) = &config.source {
        tracing::debug!("Loaded config from {}", source.display());
    }

    match cli.command {
        Command::Check {
            entity,
            actions,
            data,
            state,
        } => commands::check(&config, &entity, actions, data.as_deref(), state.as_deref()),
        Command::Snapshot => commands::snapshot(&config),
        Command::Validate { file } => commands::validate(&config, &file),
    }
}
