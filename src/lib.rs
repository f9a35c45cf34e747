//! # memwal
//!
//! The write buffer of an LSM-style key-value store:
//! - Sorted, capacity-bounded memtable with byte-wise key order
//! - All keys, values and index slots carved from one caller-owned arena
//! - Write-Ahead Logging (WAL), appended before every mutation
//! - Crash recovery by replaying the WAL on open
//!
//! ## Architecture Overview
//!
//! ```text
//!                   put(key, value)            get(key, out)
//!                         │                          │
//! ┌───────────────────────▼──────────────────────────▼──────────┐
//! │                        MemTable                              │
//! │        (single owner, lower-bound binary search)             │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │ 1. append                        │ 2. copy + insert
//!            ▼                                  ▼
//!     ┌─────────────┐                   ┌──────────────┐
//!     │     WAL     │ ── replay on ──▶  │    Arena     │
//!     │  (Append)   │      open         │ (slots, k/v) │
//!     └─────────────┘                   └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use memwal::MemTable;
//!
//! # fn main() -> memwal::Result<()> {
//! let mut buffer = vec![0u8; 1 << 20];
//! let mut table = MemTable::open_path(&mut buffer, "/tmp/memwal.log".as_ref())?;
//!
//! table.put(b"foo", b"bar")?;
//!
//! let mut out = [0u8; 16];
//! assert_eq!(table.get(b"foo", &mut out)?, Some(&b"bar"[..]));
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod arena;
pub mod wal;
pub mod memtable;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemWalError, Result};
pub use config::Config;
pub use memtable::{MemTable, PutOptions};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of memwal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
