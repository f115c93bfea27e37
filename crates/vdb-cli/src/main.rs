//! VDB CLI - Command-line interface
//!
//! Usage:
//!   vdb run
//!   vdb ingest [--fresh]
//!   vdb query <text> [-k <n>]
//!   vdb stats
//!   vdb scaffold copy <src> <dest>
//!   vdb scaffold essentials <src> <dest>
//!   vdb scaffold clean <dir>

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vdb_core::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(name = "vdb")]
#[command(about = "Local vector store ingestion and query tool")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory whose files are ingested
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Directory the index is stored in
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Default number of query results
    #[arg(short = 'k', long = "top-k", global = true)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the stale index, rebuild it and ingest the source directory
    Run,
    /// Ingest the source directory into the index
    Ingest {
        /// Delete the existing index file first
        #[arg(long)]
        fresh: bool,
    },
    /// Query the index
    Query {
        /// Text to search for
        text: String,
    },
    /// Show index location and item count
    Stats,
    /// Prepare a project folder for ingestion
    Scaffold {
        #[command(subcommand)]
        action: ScaffoldAction,
    },
}

#[derive(Subcommand)]
enum ScaffoldAction {
    /// Mirror a tree, skipping excluded folders and file types
    Copy { src: PathBuf, dest: PathBuf },
    /// Copy the configured essential files
    Essentials { src: PathBuf, dest: PathBuf },
    /// Remove everything inside a directory
    Clean { dir: PathBuf },
}

impl Cli {
    /// Configuration with command-line flags applied last
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;

        if let Some(source) = &self.source {
            config.store.source_dir = source.clone();
        }
        if let Some(index_dir) = &self.index_dir {
            config.store.index_dir = index_dir.clone();
        }
        if let Some(k) = self.top_k {
            config.store.default_top_k = k;
        }

        Ok(config)
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    init_tracing(&config.logging);

    match cli.command {
        Commands::Run => commands::run(&config).await,
        Commands::Ingest { fresh } => commands::ingest(&config, fresh).await,
        Commands::Query { text } => commands::query(&config, &text).await,
        Commands::Stats => commands::stats(&config).await,
        Commands::Scaffold { action } => match action {
            ScaffoldAction::Copy { src, dest } => commands::scaffold_copy(&config, &src, &dest).await,
            ScaffoldAction::Essentials { src, dest } => {
                commands::scaffold_essentials(&config, &src, &dest).await
            }
            ScaffoldAction::Clean { dir } => commands::scaffold_clean(&dir).await,
        },
    }
}
