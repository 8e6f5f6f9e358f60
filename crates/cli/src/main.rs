//! DeskPilot CLI — the main entry point.
//!
//! Commands:
//! - `handle`   — Run the support agent on one ticket
//! - `classify` — Recompute the outcome of a stored tool-call record
//! - `tools`    — List the support tool catalogue
//! - `config`   — Validate or initialise configuration
//! - `doctor`   — Diagnose system health

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskpilot",
    about = "DeskPilot — tool-augmented support ticket agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Use this config file instead of ~/.deskpilot/config.toml
    #[arg(short, long, global = true, env = "DESKPILOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the support agent on a ticket
    Handle {
        /// Ticket file (JSON conversation context)
        #[arg(short, long)]
        ticket: PathBuf,

        /// Only run pre-flight checks and show the assembled prompt
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a stored tool-call record
    Classify {
        /// JSON file with a record list or a stored resolution
        #[arg(short, long)]
        records: PathBuf,
    },

    /// List the support tool catalogue
    Tools,

    /// Validate configuration, or write a default config file
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Handle { ticket, dry_run } => {
            commands::handle::run(config_path, &ticket, dry_run).await?
        }
        Commands::Classify { records } => commands::classify::run(&records).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Config { init } => commands::config_cmd::run(config_path, init).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
