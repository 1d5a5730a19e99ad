//! Parallax CLI: command-line interface for capture replay and collection.
//!
//! Usage:
//!   parallax replay <FRAMES>    Run the capture pipeline over recorded inputs
//!   parallax serve              Run the record-set collection server
//!   parallax info <FILE>        Show record-set information
//!   parallax upload <FILE>      Re-send a saved record set
//!   parallax check              Print the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use parallax_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "parallax",
    about = "Multi-modal capture for motion-parallax liveness data",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/parallax/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture pipeline over a frame directory and record every frame
    Replay(commands::replay::ReplayArgs),

    /// Run the record-set collection server
    Serve {
        /// Address to bind (defaults to config)
        #[arg(long)]
        bind: Option<String>,

        /// Directory for received record sets (defaults to config)
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },

    /// Show record-set information
    Info {
        /// Path to a saved record set
        path: PathBuf,
    },

    /// Re-send a saved record set to the collector
    Upload {
        /// Path to a saved record set
        path: PathBuf,

        /// Upload URL (defaults to config)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Print the effective configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    parallax_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Replay(args) => commands::replay::run(args, config).await,
        Commands::Serve { bind, save_dir } => {
            commands::serve::run(
                bind.unwrap_or_else(|| config.collector.bind.clone()),
                save_dir.unwrap_or_else(|| config.collector.save_dir.clone()),
            )
            .await
        }
        Commands::Info { path } => commands::info::run(path),
        Commands::Upload { path, endpoint } => commands::upload::run(path, endpoint, config).await,
        Commands::Check => commands::check::run(&config),
    }
}
