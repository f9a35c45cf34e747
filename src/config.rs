//! Configuration for memwal
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MemWalError, Result};

/// Default number of entry slots in a MemTable
pub const DEFAULT_CAPACITY: usize = 512;

/// Main configuration for a MemTable instance
///
/// The arena buffer is not part of the config: callers own it and hand it
/// to [`MemTable::open`](crate::MemTable::open) directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Path of the write-ahead log (created if absent)
    ///
    /// Hosts normally pass an absolute path. A relative one, including the
    /// default `./memwal.log`, is resolved against the process's working
    /// directory when the table opens.
    pub wal_path: PathBuf,

    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    /// What replay does with a partial record at the end of the log
    pub torn_tail_policy: TornTailPolicy,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Fixed number of entry slots, never resized
    pub capacity: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Handling of a torn (partially written) final record during replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TornTailPolicy {
    /// Cut the log back to the last complete record and continue
    Truncate,

    /// Refuse to open the table
    Fail,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from("./memwal.log"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            torn_tail_policy: TornTailPolicy::Truncate,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the table cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.wal_path.as_os_str().is_empty() {
            return Err(MemWalError::Config("wal_path must not be empty".into()));
        }
        if self.capacity == 0 {
            return Err(MemWalError::Config("capacity must be at least 1".into()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(MemWalError::Config(
                "EveryNEntries sync strategy needs a count of at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the WAL path
    pub fn wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_path = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the torn tail policy
    pub fn torn_tail_policy(mut self, policy: TornTailPolicy) -> Self {
        self.config.torn_tail_policy = policy;
        self
    }

    /// Set the number of entry slots
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
