//! LanShare command-line entry point.

mod app;
mod backend;
mod config;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;

/// LanShare - share files over the local network
#[derive(Parser)]
#[command(name = "lanshare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server host (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Chunk size in bytes (overrides config)
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the file server
    Serve {
        /// Storage directory (overrides config)
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },

    /// Upload a file
    Upload {
        /// Local file to upload
        file: PathBuf,

        /// Start a local server for the duration of the command
        #[arg(long)]
        spawn_server: bool,
    },

    /// Download a stored file
    Download {
        /// Stored name on the server
        name: String,

        /// Destination path (defaults to the stored name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start a local server for the duration of the command
        #[arg(long)]
        spawn_server: bool,
    },

    /// List stored files
    List {
        /// Start a local server for the duration of the command
        #[arg(long)]
        spawn_server: bool,
    },

    /// Check whether the server is running
    Status,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Command::Serve {
            storage_dir: Some(dir),
        } = &self.command
        {
            config.storage_dir = dir.clone();
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config = cli.apply_overrides(config);
    tracing::debug!(host = %config.host, port = config.port, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(cli.command, config, cli.config))
}
