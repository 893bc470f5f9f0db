//! RingKV Server Binary
//!
//! Serves one shard and announces it to the catalog.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ringkv::discovery::CatalogClient;
use ringkv::network::Server;
use ringkv::{CatalogConfig, Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// RingKV Server
#[derive(Parser, Debug)]
#[command(name = "ringkv-server")]
#[command(about = "Storage server for one shard of a RingKV cluster")]
#[command(version)]
struct Args {
    /// Name to register under, e.g. `myproject-0`
    project: String,

    /// Data directory
    #[arg(short, long, default_value = ".")]
    data_dir: String,

    /// Listen address (host:port, port 0 picks a free one)
    #[arg(short, long, default_value = "0.0.0.0:0")]
    listen: String,

    /// Owner reported to the catalog
    #[arg(short, long, default_value = "ringkv")]
    owner: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Unsent response bytes at which a client stops being read
    #[arg(long, default_value = "4194304")]
    max_outbox_bytes: usize,

    /// Mutations between checkpoints
    #[arg(short = 'c', long, default_value = "100")]
    checkpoint_threshold: usize,

    /// Seconds between catalog announcements
    #[arg(long, default_value = "60")]
    announce_secs: u64,

    /// Catalog host
    #[arg(long, default_value = "catalog.cse.nd.edu")]
    catalog_host: String,

    /// Catalog port
    #[arg(long, default_value = "9097")]
    catalog_port: u16,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ringkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("RingKV Server v{}", ringkv::VERSION);
    tracing::info!("Project: {}", args.project);
    tracing::info!("Data directory: {}", args.data_dir);

    let catalog = CatalogConfig {
        host: args.catalog_host,
        port: args.catalog_port,
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .max_outbox_bytes(args.max_outbox_bytes)
        .checkpoint_threshold(args.checkpoint_threshold)
        .project(&args.project)
        .owner(&args.owner)
        .announce_interval(Duration::from_secs(args.announce_secs))
        .catalog(catalog.clone())
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let discovery = match CatalogClient::new(catalog) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Could not reach the catalog: {}", e);
            std::process::exit(1);
        }
    };

    let mut server = match Server::bind(config, engine) {
        Ok(server) => server.with_discovery(discovery),
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
