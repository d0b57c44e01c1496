//! FileVault Server Binary
//!
//! Starts the TCP file server.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use filevault::network::{worker_index, Server};
use filevault::{Config, Engine, Mode};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// FileVault Server
///
/// Flags override values from the optional TOML file.
#[derive(Parser, Debug)]
#[command(name = "filevault-server")]
#[command(about = "Remote file storage over a delimited text protocol")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Concurrency policy
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Worker threads or processes
    #[arg(short, long)]
    workers: Option<usize>,

    /// Interface to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// TCP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage root directory
    #[arg(short = 'd', long)]
    storage_root: Option<PathBuf>,

    /// Maximum request size in bytes
    #[arg(long)]
    max_frame_size: Option<usize>,

    /// Thread-pool queue capacity (defaults to 4 x workers)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Read timeout in milliseconds (0 disables)
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Write timeout in milliseconds (0 disables)
    #[arg(long)]
    write_timeout_ms: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "filevault=debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Append logs to this file as well as stdout
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Defaults, then the TOML file, then flags
    fn into_config(self) -> filevault::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = self.storage_root {
            config.storage_root = root;
        }
        if let Some(size) = self.max_frame_size {
            config.max_frame_size = size;
        }
        if self.queue_capacity.is_some() {
            config.queue_capacity = self.queue_capacity;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout_ms = ms;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.write_timeout_ms = ms;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Install the stdout logger, plus a file logger when one is configured
///
/// Pool workers inherit the same flags, so they all append to one file.
fn init_logging(config: &Config) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(file_layer)
        .init();
    Ok(())
}

fn main() {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("filevault-server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("filevault-server: cannot open log file: {}", e);
        std::process::exit(1);
    }

    if worker_index().is_none() {
        tracing::info!("FileVault Server v{}", filevault::VERSION);
        tracing::info!("Storage root: {}", config.storage_root.display());
        tracing::info!("Listen address: {}", config.listen_addr());
        tracing::info!("Mode: {} ({} workers)", config.mode, config.workers);
    }

    // Open engine (creates the storage root)
    let engine = match Engine::open(&config.storage_root) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    // Start server
    let server = Server::new(config, engine);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
