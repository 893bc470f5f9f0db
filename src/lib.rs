//! # RingKV
//!
//! A sharded, replicated key-value store with:
//! - Write-Ahead Logging (WAL) with periodic checkpoint compaction
//! - Crash recovery from checkpoint + WAL replay
//! - A length-prefixed JSON protocol over TCP
//! - Client-side replica routing over a hash ring
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Cluster Router                           │
//! │         (hash ring, replica fan-out, retry, scan merge)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  one Client stub per server
//!                       ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Server Dispatch Loop (mio)                   │
//! │        (frame reassembly, validation, catalog announce)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │ (BTreeMap)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ every 100 mutations
//!                                   ▼
//!                           ┌─────────────┐
//!                           │ Checkpoint  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod memtable;
pub mod wal;
pub mod storage;
pub mod engine;
pub mod network;
pub mod discovery;
pub mod client;
pub mod cluster;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RingError, Result};
pub use config::{CatalogConfig, ClusterConfig, Config};
pub use engine::{Engine, Outcome};
pub use client::Client;
pub use cluster::{ClusterRouter, Ring};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RingKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
