//! MemTable Module
//!
//! Sorted, capacity-bounded in-memory index of recent writes.
//!
//! ## Responsibilities
//! - Accept writes after logging them to the WAL
//! - Keep entries sorted by key with no duplicates
//! - Rebuild state from the WAL on open
//! - Ordered iteration for a future flush to sorted files
//!
//! ## Data Structure Choice
//! A fixed array of slots carved out of the arena, searched by lower-bound
//! binary search and shifted in place on insert:
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────┬──────┐
//! │ slot array (capacity × 16 B) │ key/value bytes, append-only │ free │
//! └──────────────────────────────┴──────────────────────────────┴──────┘
//! ```
//!
//! Each slot holds two [`Span`]s (key, value) so the whole table lives in
//! one monotonic region with no per-entry frees.

mod table;

pub use table::{Iter, MemTable};

use bytes::{Buf, BufMut};

use crate::arena::Span;

/// Encoded size of one slot
pub(crate) const SLOT_SIZE: usize = 16;

/// Options for [`MemTable::put_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Apply without appending to the WAL. Used when replaying the log.
    pub skip_log: bool,
}

/// One index slot: where a key and its value live in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub key: Span,
    pub value: Span,
}

impl Slot {
    pub fn encode(&self, mut out: &mut [u8]) {
        out.put_u32_le(self.key.offset);
        out.put_u32_le(self.key.len);
        out.put_u32_le(self.value.offset);
        out.put_u32_le(self.value.len);
    }

    pub fn decode(mut bytes: &[u8]) -> Self {
        let key = Span {
            offset: bytes.get_u32_le(),
            len: bytes.get_u32_le(),
        };
        let value = Span {
            offset: bytes.get_u32_le(),
            len: bytes.get_u32_le(),
        };
        Self { key, value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_encoding() {
        let slot = Slot {
            key: Span { offset: 1, len: 2 },
            value: Span { offset: 0x0102_0304, len: 4 },
        };
        let mut raw = [0u8; SLOT_SIZE];
        slot.encode(&mut raw);

        assert_eq!(&raw[8..12], &[4, 3, 2, 1]);
        assert_eq!(Slot::decode(&raw), slot);
    }
}
