//! Engine Module
//!
//! The storage engine of a single server.
//!
//! ## Responsibilities
//! - Apply requests to the memtable
//! - Log every mutation to the WAL before applying it
//! - Fold the WAL into a checkpoint once enough mutations pile up
//! - Rebuild state from checkpoint + WAL on startup

use std::fs;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::protocol::Request;
use crate::storage::Checkpoint;
use crate::wal::{WalRecovery, WalWriter};

/// What a request produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Insert applied
    Inserted { key: String },

    /// Value found by lookup or removed by remove
    Value(Value),

    /// Lookup or remove on an absent key
    NotFound,

    /// Scan matches, in key order
    Matches(Vec<(String, Value)>),
}

/// Whether a mutation still has to be written to the WAL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Logging {
    /// Live request: append before applying
    Append,

    /// Replayed entry that is already in the WAL
    AlreadyLogged,
}

/// The storage engine
///
/// ## Concurrency Model
///
/// Methods that mutate take `&mut self`. The server loop owns the engine and
/// is its only caller, so the memtable needs no lock.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Live key-value state
    table: MemTable,

    /// Write-ahead log
    wal: WalWriter,

    /// Snapshot file
    checkpoint: Checkpoint,

    /// Mutations applied since the last checkpoint
    mutations: usize,

    /// Checkpoints written since open
    compactions: u64,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "table.txn";
    const CHECKPOINT_FILENAME: &'static str = "table.ckpt";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory and empty checkpoint/WAL files if absent
    /// 2. Load the checkpoint
    /// 3. Replay the WAL through `execute`'s path
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let checkpoint = Checkpoint::new(config.data_dir.join(Self::CHECKPOINT_FILENAME));
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        checkpoint.ensure_exists()?;

        tracing::info!("Restoring previous checkpoint from {}", checkpoint.path().display());

        let mut table = MemTable::new();
        let loaded = checkpoint.load_into(&mut table)?;

        // Truncates a torn tail before the writer reopens the file for append
        let (entries, recovery) = WalRecovery::recover(&wal_path)?;
        let wal = WalWriter::open(&wal_path)?;

        let mut engine = Self {
            config,
            table,
            wal,
            checkpoint,
            mutations: 0,
            compactions: 0,
        };

        // Entries stay in the WAL until a compaction during replay deletes
        // it; anything replayed after that must be logged again.
        let mut logging = Logging::AlreadyLogged;
        for request in entries {
            let before = engine.compactions;
            engine.apply(request, logging)?;
            if engine.compactions != before {
                logging = Logging::Append;
            }
        }

        tracing::info!(
            "Previous checkpoint restored: {} records, {} WAL entries replayed{}",
            loaded,
            recovery.entries_recovered,
            if recovery.was_truncated { " (torn tail dropped)" } else { "" }
        );

        Ok(engine)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Execute a request
    ///
    /// Requests that would not decode back out of the WAL are rejected
    /// before anything is logged.
    pub fn execute(&mut self, request: Request) -> Result<Outcome> {
        request.validate()?;
        self.apply(request, Logging::Append)
    }

    /// Insert or overwrite a key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        self.execute(Request::Insert {
            key: key.into(),
            value,
        })?;
        Ok(())
    }

    /// Get a value by key
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.table.get(key)
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: impl Into<String>) -> Result<Option<Value>> {
        match self.execute(Request::Remove { key: key.into() })? {
            Outcome::Value(value) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    /// Pairs whose key contains a match for `pattern`
    pub fn scan(&self, pattern: &str) -> Result<Vec<(String, Value)>> {
        let regex = Regex::new(pattern)?;
        Ok(self.table.scan(&regex))
    }

    /// Fold the memtable into a fresh checkpoint and delete the WAL
    pub fn checkpoint(&mut self) -> Result<()> {
        self.checkpoint.write(&self.table)?;
        self.mutations = 0;
        self.compactions += 1;

        // The checkpoint already covers everything in the WAL, so a
        // leftover log only replays operations whose effects it holds.
        if let Err(e) = self.wal.discard() {
            tracing::warn!("Unable to delete WAL {}: {}", self.wal.path().display(), e);
        }

        tracing::debug!("Checkpoint written with {} records", self.table.len());
        Ok(())
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn apply(&mut self, request: Request, logging: Logging) -> Result<Outcome> {
        let mutation = request.is_mutation();
        if mutation && logging == Logging::Append {
            self.wal.append(&request)?;
        }

        let outcome = match request {
            Request::Insert { key, value } => {
                self.table.insert(key.clone(), value);
                Outcome::Inserted { key }
            }
            Request::Lookup { key } => match self.table.get(&key) {
                Some(value) => Outcome::Value(value.clone()),
                None => Outcome::NotFound,
            },
            Request::Remove { key } => match self.table.remove(&key) {
                Some(value) => Outcome::Value(value),
                None => Outcome::NotFound,
            },
            Request::Scan { regex } => Outcome::Matches(self.scan(&regex)?),
        };

        if mutation {
            self.mutations += 1;
            if self.mutations > self.config.checkpoint_threshold {
                self.checkpoint()?;
            }
        }

        Ok(outcome)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the write-ahead log
    pub fn wal_path(&self) -> &Path {
        self.wal.path()
    }

    /// Path of the checkpoint file
    pub fn checkpoint_path(&self) -> &Path {
        self.checkpoint.path()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Mutations applied since the last checkpoint
    pub fn mutations_since_checkpoint(&self) -> usize {
        self.mutations
    }

    /// Checkpoints written since the engine was opened
    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    /// Read-only view of the live state
    pub fn table(&self) -> &MemTable {
        &self.table
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
