//! cardrelayd - card swipe relay daemon

use anyhow::Result;
use cardrelay_core::constants::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "cardrelayd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the JSON parameter file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Backlog database path, overriding the parameter file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture swipes and deliver them (default)
    Run,

    /// List input devices and whether each is on the allow-list
    Devices,

    /// Show scans waiting in the backlog
    Backlog {
        /// Print every waiting scan as a JSON line
        #[arg(short, long)]
        list: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::execute(cli.config, cli.database).await,
        Commands::Devices => commands::devices::execute(cli.config),
        Commands::Backlog { list } => {
            commands::backlog::execute(cli.config, cli.database, list).await
        }
    }
}
