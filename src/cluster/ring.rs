//! Shard placement

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Shard for keys that cannot be hashed
///
/// Non-string keys are still sent to a real server, which rejects them with
/// `Invalid Request`, so the caller gets a structured error back instead of
/// a client-side failure.
pub const UNHASHABLE_SHARD: usize = 0;

/// Placement of keys on `n` servers with `k` copies each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    servers: usize,
    replication_factor: usize,
}

impl Ring {
    /// A ring of `servers` shards keeping `replication_factor` copies
    ///
    /// Both values are clamped to at least 1.
    pub fn new(servers: usize, replication_factor: usize) -> Self {
        Self {
            servers: servers.max(1),
            replication_factor: replication_factor.max(1),
        }
    }

    pub fn servers(&self) -> usize {
        self.servers
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// Primary shard of `key`
    pub fn shard_for(&self, key: &Value) -> usize {
        match key {
            Value::String(key) => self.shard_for_str(key),
            _ => UNHASHABLE_SHARD,
        }
    }

    /// Primary shard of a string key: SHA-256, first 8 bytes, mod n
    pub fn shard_for_str(&self, key: &str) -> usize {
        let digest = Sha256::digest(key.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(prefix) % self.servers as u64) as usize
    }

    /// Ordered replica shards of `key`
    pub fn replicas(&self, key: &Value) -> Vec<usize> {
        self.replicas_from(self.shard_for(key))
    }

    /// `primary` followed by its successors, wrapping at n
    ///
    /// Yields `min(k, n)` distinct shards.
    pub fn replicas_from(&self, primary: usize) -> Vec<usize> {
        let count = self.replication_factor.min(self.servers);
        (0..count)
            .map(|offset| (primary + offset) % self.servers)
            .collect()
    }
}
