//! Error types for memwal
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using MemWalError
pub type Result<T> = std::result::Result<T, MemWalError>;

/// Unified error type for memwal operations
#[derive(Debug, Error)]
pub enum MemWalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // MemTable Errors
    // -------------------------------------------------------------------------
    /// Inserting a new key would exceed the slot capacity.
    /// Recoverable: flush this table and start a new one.
    #[error("MemTable full: all {capacity} slots are occupied")]
    MemTableFull { capacity: usize },

    /// A previous arena exhaustion or WAL failure left the table unsafe for writes.
    #[error("MemTable is unusable after a fatal arena or WAL failure")]
    Unusable,

    #[error("Output buffer too small: value needs {needed} bytes, buffer has {available}")]
    BufferTooSmall { needed: usize, available: usize },

    // -------------------------------------------------------------------------
    // Arena Errors
    // -------------------------------------------------------------------------
    #[error("Out of arena space: requested {requested} bytes, {remaining} remaining")]
    OutOfArenaSpace { requested: usize, remaining: usize },

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    /// A partial record at the tail of the log, left by a crash mid-append.
    #[error("Torn WAL record at offset {offset}")]
    TornRecord { offset: u64 },

    /// An earlier failed append or fsync left the log contents unknown.
    #[error("WAL is poisoned by an earlier failed write or sync")]
    WalPoisoned,

    #[error("Record field of {len} bytes exceeds the u32 length limit")]
    RecordTooLarge { len: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MemWalError {
    /// Whether the owning MemTable must stop accepting writes after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OutOfArenaSpace { .. } | Self::Unusable | Self::WalPoisoned
        )
    }
}
