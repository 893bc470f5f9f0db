//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::protocol::Request;
use crate::storage::sync_parent_dir;

/// Writes entries to the WAL file
///
/// The handle is opened lazily: after `discard` deletes the file, the next
/// append recreates it.
pub struct WalWriter {
    /// Location of the log
    path: PathBuf,

    /// Open append handle, if any
    file: Option<File>,

    /// Length of the file after the last complete append
    len: u64,

    /// Entries appended through this writer since open or discard
    appended: u64,
}

impl WalWriter {
    /// Open or create a WAL file
    pub fn open(path: &Path) -> Result<Self> {
        let mut writer = Self {
            path: path.to_path_buf(),
            file: None,
            len: 0,
            appended: 0,
        };
        writer.file_mut()?;
        Ok(writer)
    }

    /// Append one request and fsync it
    ///
    /// On failure the file is cut back to its previous length so a partial
    /// line never sits in front of later entries.
    pub fn append(&mut self, request: &Request) -> Result<()> {
        let mut line = request.to_json()?;
        line.push(b'\n');

        let start = self.len;
        let file = self.file_mut()?;
        let written = file.write_all(&line).and_then(|_| file.sync_data());

        if let Err(err) = written {
            if let Some(file) = self.file.take() {
                if let Err(trunc_err) = file.set_len(start) {
                    tracing::error!("Failed to roll back partial WAL append: {}", trunc_err);
                }
            }
            return Err(err.into());
        }

        self.len += line.len() as u64;
        self.appended += 1;
        Ok(())
    }

    /// Close and delete the log file
    pub fn discard(&mut self) -> Result<()> {
        self.file = None;
        self.len = 0;
        self.appended = 0;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(sync_parent_dir(&self.path)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries appended since open or the last discard
    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_mut(&mut self) -> Result<&mut File> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let created = !self.path.exists();
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                if created {
                    sync_parent_dir(&self.path)?;
                }
                self.len = file.metadata()?.len();
                file
            }
        };
        Ok(self.file.insert(file))
    }
}
