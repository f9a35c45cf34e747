//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record before the memtable index is mutated
//! - Sequential replay to rebuild the memtable after restart
//! - Explicit handling of a torn final record (see [`TornTailPolicy`])
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Record 1                                         │
//! │ ┌─────────────┬─────┬───────────────┬─────────┐  │
//! │ │ KeyLen (4)  │ Key │ ValueLen (4)  │ Value   │  │
//! │ └─────────────┴─────┴───────────────┴─────────┘  │
//! ├──────────────────────────────────────────────────┤
//! │ Record 2                                         │
//! │ ┌─────────────┬─────┬───────────────┬─────────┐  │
//! │ │ KeyLen (4)  │ Key │ ValueLen (4)  │ Value   │  │
//! │ └─────────────┴─────┴───────────────┴─────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are little-endian `u32`. There is no header, separator or
//! checksum; record boundaries follow from the lengths alone.
//!
//! [`TornTailPolicy`]: crate::config::TornTailPolicy

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{WalRecord, LENGTH_PREFIX_SIZE};
pub use writer::WalWriter;
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
