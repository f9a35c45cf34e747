//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::TornTailPolicy;
use crate::error::{MemWalError, Result};

use super::{WalReader, WalRecord};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of complete records applied
    pub records_replayed: u64,

    /// Length of the log up to the end of the last complete record
    pub valid_len: u64,

    /// Whether a torn tail was found after `valid_len`.
    /// `replay` has cut it off; `verify` only reports it.
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Replay every complete record in `file` through `apply`
    ///
    /// Reads from offset 0 regardless of the handle's position. A torn
    /// final record is cut off or rejected according to `policy`; errors
    /// returned by `apply` abort the replay.
    ///
    /// A handle whose first read is refused (`PermissionDenied` or
    /// `Unsupported`) replays as an empty log. `MemTable::open` always opens
    /// the log readable, so this only applies to handles passed in directly.
    pub fn replay<F>(file: &File, policy: TornTailPolicy, apply: F) -> Result<RecoveryResult>
    where
        F: FnMut(WalRecord) -> Result<()>,
    {
        Self::scan(file, policy, true, apply)
    }

    /// Check the integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let file = File::open(path)?;
        Self::scan(&file, TornTailPolicy::Truncate, false, |_| Ok(()))
    }

    fn scan<F>(
        mut file: &File,
        policy: TornTailPolicy,
        truncate: bool,
        mut apply: F,
    ) -> Result<RecoveryResult>
    where
        F: FnMut(WalRecord) -> Result<()>,
    {
        file.seek(SeekFrom::Start(0))?;
        let mut reader = WalReader::new(file);
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_record() {
                Ok(Some(record)) => {
                    apply(record)?;
                    result.records_replayed += 1;
                }
                Ok(None) => break,
                Err(MemWalError::TornRecord { offset }) => {
                    let file_len = file.metadata()?.len();
                    match policy {
                        TornTailPolicy::Fail => {
                            return Err(MemWalError::WalCorruption(format!(
                                "partial record at offset {} of {} byte log",
                                offset, file_len
                            )));
                        }
                        TornTailPolicy::Truncate => {
                            warn!(
                                offset,
                                discarded = file_len - offset,
                                "WAL ends in a partial record; dropping it"
                            );
                            if truncate {
                                file.set_len(offset)?;
                                file.sync_all()?;
                            }
                            result.was_truncated = true;
                            break;
                        }
                    }
                }
                // A handle that cannot be read carries no prior state
                Err(MemWalError::Io(e))
                    if result.records_replayed == 0 && is_unreadable(&e) =>
                {
                    debug!(error = %e, "WAL not readable; treating as empty");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        result.valid_len = reader.position();
        Ok(result)
    }
}

fn is_unreadable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::Unsupported
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_reads_count_as_unreadable() {
        assert!(is_unreadable(&io::ErrorKind::PermissionDenied.into()));
        assert!(is_unreadable(&io::ErrorKind::Unsupported.into()));

        assert!(!is_unreadable(&io::ErrorKind::UnexpectedEof.into()));
        assert!(!is_unreadable(&io::ErrorKind::InvalidData.into()));
        assert!(!is_unreadable(&io::Error::new(io::ErrorKind::Other, "disk")));
    }
}
