//! MemTable Module
//!
//! In-memory map holding the live state of one server.
//!
//! ## Responsibilities
//! - Point reads and writes
//! - Regex scans over keys
//! - Ordered iteration for checkpoint snapshots
//!
//! ## Data Structure Choice
//! A BTreeMap: ordered keys give scans and checkpoints a stable, sorted
//! order. The server loop is the only mutator, so no lock wraps it.

mod table;

pub use table::MemTable;
