//! Configuration for RingKV
//!
//! Centralized configuration with sensible defaults. `Config` drives a single
//! storage server, `ClusterConfig` drives the client-side router and
//! `CatalogConfig` locates the discovery service both of them talk to.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, RingError};

/// Default number of mutations between checkpoints
pub const DEFAULT_CHECKPOINT_THRESHOLD: usize = 100;

/// Default interval between catalog announcements
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(60);

/// Default outbox high-water mark per connection
pub const DEFAULT_MAX_OUTBOX_BYTES: usize = 4 * 1024 * 1024;

/// Default wait between router retries
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);

// =============================================================================
// Catalog
// =============================================================================

/// Location of the discovery catalog
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog host name
    pub host: String,

    /// Port used both for UDP updates and HTTP queries
    pub port: u16,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            host: "catalog.cse.nd.edu".to_string(),
            port: 9097,
        }
    }
}

impl CatalogConfig {
    /// `host:port` target for UDP registration datagrams
    pub fn update_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL of the catalog's JSON listing
    pub fn query_url(&self) -> String {
        format!("http://{}:{}/query.json", self.host, self.port)
    }
}

// =============================================================================
// Server
// =============================================================================

/// Main configuration for a RingKV storage server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the durable state:
    ///   {data_dir}/
    ///     ├── table.ckpt       (checkpoint)
    ///     └── table.txn        (write-ahead log)
    pub data_dir: PathBuf,

    /// Mutations tolerated in the WAL before it is folded into a checkpoint.
    /// Compaction runs once the count exceeds this value.
    pub checkpoint_threshold: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address; port 0 picks an ephemeral port
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Unsent response bytes at which a connection stops being read
    /// until its peer catches up
    pub max_outbox_bytes: usize,

    // -------------------------------------------------------------------------
    // Discovery Configuration
    // -------------------------------------------------------------------------
    /// Name this server registers under (e.g. `myproject-0`)
    pub project: String,

    /// Owner reported in registrations
    pub owner: String,

    /// How often the server re-announces itself
    pub announce_interval: Duration,

    /// Catalog endpoint
    pub catalog: CatalogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            checkpoint_threshold: DEFAULT_CHECKPOINT_THRESHOLD,
            listen_addr: "0.0.0.0:0".to_string(),
            max_connections: 1024,
            max_outbox_bytes: DEFAULT_MAX_OUTBOX_BYTES,
            project: "ringkv".to_string(),
            owner: "ringkv".to_string(),
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the number of mutations between checkpoints
    pub fn checkpoint_threshold(mut self, count: usize) -> Self {
        self.config.checkpoint_threshold = count;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the per-connection outbox high-water mark
    pub fn max_outbox_bytes(mut self, bytes: usize) -> Self {
        self.config.max_outbox_bytes = bytes;
        self
    }

    /// Set the name registered with the catalog
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.config.project = project.into();
        self
    }

    /// Set the owner reported to the catalog
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.config.owner = owner.into();
        self
    }

    /// Set the announcement interval
    pub fn announce_interval(mut self, interval: Duration) -> Self {
        self.config.announce_interval = interval;
        self
    }

    /// Set the catalog endpoint
    pub fn catalog(mut self, catalog: CatalogConfig) -> Self {
        self.config.catalog = catalog;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Cluster
// =============================================================================

/// Configuration for the client-side cluster router
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Project prefix; server `i` registers as `{project}-{i}`
    pub project: String,

    /// Number of servers in the cluster (`n`)
    pub servers: usize,

    /// Copies kept of every key (`k`)
    pub replication_factor: usize,

    /// Wait between retries against a failing replica
    pub retry_backoff: Duration,

    /// Connect timeout for each replica (None blocks on the OS default)
    pub connect_timeout: Option<Duration>,

    /// Catalog endpoint
    pub catalog: CatalogConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            project: "ringkv".to_string(),
            servers: 1,
            replication_factor: 1,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            connect_timeout: Some(Duration::from_secs(30)),
            catalog: CatalogConfig::default(),
        }
    }
}

impl ClusterConfig {
    /// Create a new cluster config builder
    pub fn builder() -> ClusterConfigBuilder {
        ClusterConfigBuilder::default()
    }

    /// Name server `index` registers under
    pub fn server_name(&self, index: usize) -> String {
        format!("{}-{}", self.project, index)
    }

    /// Reject shapes the ring cannot serve
    pub fn validate(&self) -> Result<()> {
        if self.servers == 0 {
            return Err(RingError::Config("cluster needs at least one server".into()));
        }
        if self.replication_factor == 0 {
            return Err(RingError::Config("replication factor must be at least 1".into()));
        }
        Ok(())
    }
}

/// Builder for ClusterConfig
#[derive(Default)]
pub struct ClusterConfigBuilder {
    config: ClusterConfig,
}

impl ClusterConfigBuilder {
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.config.project = project.into();
        self
    }

    /// Set `n`
    pub fn servers(mut self, n: usize) -> Self {
        self.config.servers = n;
        self
    }

    /// Set `k`
    pub fn replication_factor(mut self, k: usize) -> Self {
        self.config.replication_factor = k;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn catalog(mut self, catalog: CatalogConfig) -> Self {
        self.config.catalog = catalog;
        self
    }

    pub fn build(self) -> ClusterConfig {
        self.config
    }
}
