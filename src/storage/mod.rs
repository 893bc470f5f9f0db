//! Storage Module
//!
//! Persistent snapshot of the memtable.
//!
//! ## Responsibilities
//! - Write a full snapshot atomically (temp file, fsync, rename)
//! - Load the snapshot on startup
//!
//! ## File Format
//! ```text
//! {"key":"a","value":{"x":1}}
//! {"key":"b","value":"plain"}
//! ```
//! One record per line, in key order. A crash while writing leaves the
//! previous checkpoint untouched; only the `.tmp` file is partial.

mod checkpoint;

use std::io;
use std::path::Path;

pub use checkpoint::{Checkpoint, CheckpointRecord};

/// Flush the directory entry changes (create, rename, unlink) of `path`
///
/// A file's own fsync does not cover its name. Without this, a crash may
/// keep a later unlink while losing an earlier rename.
pub fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    sync_dir(dir)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

// Directories cannot be opened as files here; renames are flushed by the OS
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
