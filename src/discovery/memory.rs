//! In-process catalog
//!
//! Keeps registrations in a map. Every registration is recorded against the
//! configured host, the way a real catalog records the sender's address.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use super::{Discovery, Registration, ServerAddress};

/// Catalog held in memory
pub struct MemoryCatalog {
    host: String,
    records: RwLock<HashMap<String, ServerAddress>>,
}

impl MemoryCatalog {
    /// Catalog that records registrations as coming from `127.0.0.1`
    pub fn new() -> Self {
        Self::with_host("127.0.0.1")
    }

    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Point `project` at `address` directly
    pub fn insert(&self, project: impl Into<String>, address: ServerAddress) {
        self.records.write().insert(project.into(), address);
    }

    /// Forget `project`
    pub fn remove(&self, project: &str) -> Option<ServerAddress> {
        self.records.write().remove(project)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery for MemoryCatalog {
    fn register(&self, registration: &Registration) -> Result<()> {
        let address = ServerAddress::new(self.host.clone(), registration.port);
        self.records
            .write()
            .insert(registration.project.clone(), address);
        Ok(())
    }

    fn query(&self, project: &str) -> Result<Option<ServerAddress>> {
        Ok(self.records.read().get(project).cloned())
    }
}
