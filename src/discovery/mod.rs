//! Discovery Module
//!
//! Boundary to the catalog service that maps server names to addresses.
//!
//! Servers `register` themselves periodically; clients `query` a name and
//! get back the most recently announced address. The catalog itself is an
//! external service: `CatalogClient` talks to a real one, `MemoryCatalog`
//! stands in for it inside a single process.

mod catalog;
mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use catalog::{select_latest, CatalogClient, CatalogEntry};
pub use memory::MemoryCatalog;

/// Service type every RingKV server announces
pub const SERVICE_TYPE: &str = "hashtable";

/// Host and port of one server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Announcement a server publishes about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "type")]
    pub kind: String,
    pub owner: String,
    pub port: u16,
    pub project: String,
}

impl Registration {
    pub fn new(project: impl Into<String>, owner: impl Into<String>, port: u16) -> Self {
        Self {
            kind: SERVICE_TYPE.to_string(),
            owner: owner.into(),
            port,
            project: project.into(),
        }
    }
}

/// Name service used by servers and the router
pub trait Discovery: Send + Sync {
    /// Publish (or refresh) a server's registration
    fn register(&self, registration: &Registration) -> Result<()>;

    /// Latest address announced under `project`, if any
    fn query(&self, project: &str) -> Result<Option<ServerAddress>>;
}
