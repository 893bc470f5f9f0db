//! RingKV CLI Client
//!
//! Runs one operation against a cluster.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ringkv::discovery::CatalogClient;
use ringkv::{CatalogConfig, ClusterConfig, ClusterRouter};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// RingKV CLI
#[derive(Parser, Debug)]
#[command(name = "ringkv-cli")]
#[command(about = "CLI for a RingKV cluster")]
struct Args {
    /// Project prefix; servers are `<PROJECT>-0` .. `<PROJECT>-<N-1>`
    project: String,

    /// Number of servers
    n: usize,

    /// Replication factor
    k: usize,

    /// Seconds to wait between retries
    #[arg(long, default_value = "5")]
    retry_secs: u64,

    /// Catalog host
    #[arg(long, default_value = "catalog.cse.nd.edu")]
    catalog_host: String,

    /// Catalog port
    #[arg(long, default_value = "9097")]
    catalog_port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a key; the value is parsed as JSON, falling back to a string
    Insert {
        key: String,
        value: String,
    },

    /// Look a key up
    Lookup {
        key: String,
    },

    /// Remove a key
    Remove {
        key: String,
    },

    /// List pairs whose key matches a regular expression
    Scan {
        pattern: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let catalog = CatalogConfig {
        host: args.catalog_host,
        port: args.catalog_port,
    };
    let config = ClusterConfig::builder()
        .project(&args.project)
        .servers(args.n)
        .replication_factor(args.k)
        .retry_backoff(Duration::from_secs(args.retry_secs))
        .catalog(catalog.clone())
        .build();

    let router = match CatalogClient::new(catalog)
        .and_then(|discovery| ClusterRouter::connect(config, Arc::new(discovery)))
    {
        Ok(router) => router,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Insert { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            router.insert(key.as_str(), value).map(|()| Value::Bool(true))
        }
        Commands::Lookup { key } => router.lookup(key.as_str()).map(|v| v.unwrap_or(Value::Null)),
        Commands::Remove { key } => router.remove(key.as_str()).map(|v| v.unwrap_or(Value::Null)),
        Commands::Scan { pattern } => router
            .scan(pattern.as_str())
            .map(|pairs| Value::Object(pairs.into_iter().collect())),
    };

    match result {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
