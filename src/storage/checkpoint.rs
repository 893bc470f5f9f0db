//! Checkpoint file
//!
//! Full snapshots of the memtable.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RingError};
use crate::memtable::MemTable;

/// One line of a checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub key: String,
    pub value: Value,
}

/// A checkpoint file and its temporary sibling
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    /// Create an empty, synced checkpoint if none exists yet
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.path.exists() {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&self.path)?;
            file.sync_all()?;
            super::sync_parent_dir(&self.path)?;
        }
        Ok(())
    }

    /// Load every record into `table`, returning how many were read
    pub fn load_into(&self, table: &mut MemTable) -> Result<usize> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut loaded = 0;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CheckpointRecord = serde_json::from_str(&line).map_err(|e| {
                RingError::Storage(format!(
                    "{}: line {}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ))
            })?;
            table.insert(record.key, record.value);
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Atomically replace the checkpoint with the contents of `table`
    pub fn write(&self, table: &MemTable) -> Result<()> {
        {
            let file = File::create(&self.tmp_path)?;
            let mut writer = BufWriter::new(file);

            for (key, value) in table.iter() {
                serde_json::to_writer(&mut writer, &RecordRef { key, value })?;
                writer.write_all(b"\n")?;
            }

            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        fs::rename(&self.tmp_path, &self.path)?;
        // The rename must be on disk before the caller deletes the WAL
        super::sync_parent_dir(&self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }
}

/// Borrowed form of `CheckpointRecord` for writing without clones
#[derive(Serialize)]
struct RecordRef<'a> {
    key: &'a str,
    value: &'a Value,
}
