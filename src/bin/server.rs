//! LodeKV Server Binary
//!
//! Starts the TCP server for LodeKV.

use std::sync::Arc;

use clap::Parser;
use lodekv::config::LogSyncStrategy;
use lodekv::network::Server;
use lodekv::{Config, StorageCore};
use tracing_subscriber::{fmt, EnvFilter};

/// LodeKV Server
#[derive(Parser, Debug)]
#[command(name = "lodekv-server")]
#[command(about = "Networked key-value store with journal recovery")]
#[command(version)]
struct Args {
    /// Data directory (journals live here)
    #[arg(short, long, default_value = "./lodekv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8001")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Bytes per socket read; also the longest accepted command line
    #[arg(short, long, default_value = "1024")]
    buffer_size: usize,

    /// fsync the journal after every write instead of every 100 entries
    #[arg(long)]
    sync_every_write: bool,

    /// Do not journal mutations
    #[arg(long)]
    no_journal: bool,

    /// Do not replay the journal at startup
    #[arg(long)]
    no_recover: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lodekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("LodeKV Server v{}", lodekv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = if args.sync_every_write {
        LogSyncStrategy::EveryWrite
    } else {
        LogSyncStrategy::EveryNEntries { count: 100 }
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_buffer_size(args.buffer_size)
        .log_sync_strategy(sync_strategy)
        .journal_enabled(!args.no_journal)
        .recover_on_startup(!args.no_recover)
        .build();

    // Open storage
    let core = match StorageCore::open(&config) {
        Ok(core) => Arc::new(core),
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Storage initialized successfully");

    let server = match Server::new(config, core) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
