//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{error, trace, warn};

use crate::config::WalSyncStrategy;
use crate::error::{MemWalError, Result};

use super::WalRecord;

/// Appends records to the WAL file
#[derive(Debug)]
pub struct WalWriter {
    /// Log file, opened in append mode
    file: File,
    /// When to fsync
    sync_strategy: WalSyncStrategy,
    /// Records written since the last fsync
    uncommitted: usize,
    /// Records appended through this writer
    records_written: u64,
    /// Current file length (end of the last complete record)
    len: u64,
    /// Reused encode buffer
    scratch: Vec<u8>,
    /// Set when a failed write or fsync left the file contents unknown
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file for read and append
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        Self::from_file(file, sync_strategy)
    }

    /// Wrap an already opened log file
    ///
    /// The file must have been opened with append access.
    pub fn from_file(file: File, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            sync_strategy,
            uncommitted: 0,
            records_written: 0,
            len,
            scratch: Vec::new(),
            poisoned: false,
        })
    }

    /// Append one record, returning the offset it starts at
    ///
    /// The record is handed to the OS with a single write before this
    /// returns; fsync follows the configured [`WalSyncStrategy`]. If the
    /// write or its fsync fails the file is cut back to its previous length,
    /// so a failed record is never replayed and never precedes later ones.
    /// When that cut cannot be made, or the fsync failed, the writer is
    /// poisoned and refuses every later append.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(MemWalError::WalPoisoned);
        }

        self.scratch.clear();
        WalRecord::encode(key, value, &mut self.scratch)?;

        let offset = self.len;
        if let Err(e) = self.file.write_all(&self.scratch) {
            self.roll_back(offset);
            return Err(e.into());
        }

        self.len += self.scratch.len() as u64;
        self.records_written += 1;
        self.uncommitted += 1;
        trace!(offset, bytes = self.scratch.len(), "WAL append");

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if should_sync {
            if let Err(e) = self.sync() {
                self.records_written -= 1;
                self.uncommitted -= 1;
                self.roll_back(offset);
                return Err(e);
            }
        }

        Ok(offset)
    }

    /// Force sync to disk
    ///
    /// A failed fsync poisons the writer: what reached the disk is unknown.
    pub fn sync(&mut self) -> Result<()> {
        if let Err(e) = self.file.flush().and_then(|()| self.file.sync_data()) {
            self.poisoned = true;
            error!(len = self.len, error = %e, "WAL fsync failed; writer poisoned");
            return Err(e.into());
        }
        self.uncommitted = 0;
        Ok(())
    }

    /// Cut the file back to `offset` after a failed append
    fn roll_back(&mut self, offset: u64) {
        match self.file.set_len(offset) {
            Ok(()) => self.len = offset,
            Err(e) => {
                self.poisoned = true;
                warn!(
                    offset,
                    error = %e,
                    "failed to roll back partial WAL append; writer poisoned"
                );
            }
        }
    }

    /// Re-read the file length, e.g. after recovery truncated the tail
    pub fn refresh_len(&mut self) -> Result<()> {
        self.len = self.file.metadata()?.len();
        Ok(())
    }

    /// Whether a failed write or fsync has disabled this writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Records written since the last fsync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Records appended through this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Current length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
