//! WAL Recovery
//!
//! Reads the WAL back after a restart.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::{Result, RingError};
use crate::protocol::Request;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Whether an unterminated final line was dropped
    pub was_truncated: bool,

    /// Bytes removed from the end of the file
    pub bytes_truncated: u64,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Decode every newline-terminated entry, in order
    /// 2. Fail on an undecodable entry that is followed by others
    /// 3. Drop and truncate an unterminated final line (a write that was
    ///    cut off before its fsync, so it was never acknowledged)
    ///
    /// A missing file recovers as empty.
    pub fn recover(path: &Path) -> Result<(Vec<Request>, RecoveryResult)> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Vec::new(), RecoveryResult::default()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();
        let mut offset = 0usize;
        let mut line_no = 0usize;

        while offset < bytes.len() {
            let Some(end) = bytes[offset..].iter().position(|&b| b == b'\n') else {
                break;
            };
            let line = &bytes[offset..offset + end];
            line_no += 1;
            offset += end + 1;

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let request = Request::from_json(line).map_err(|e| {
                RingError::WalCorruption(format!("{}: line {}: {}", path.display(), line_no, e))
            })?;
            entries.push(request);
            result.entries_recovered += 1;
        }

        if offset < bytes.len() {
            result.was_truncated = true;
            result.bytes_truncated = (bytes.len() - offset) as u64;

            tracing::warn!(
                "Dropping {} bytes of torn WAL tail in {}",
                result.bytes_truncated,
                path.display()
            );

            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset as u64)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }
}
