//! MemTable implementation
//!
//! Arena-backed sorted slot array with a write-ahead log.

use std::fs::OpenOptions;
use std::path::Path;

use tracing::{debug, error, info, trace};

use crate::arena::{Arena, Span};
use crate::config::Config;
use crate::error::{MemWalError, Result};
use crate::wal::{RecoveryResult, WalRecovery, WalWriter};

use super::{PutOptions, Slot, SLOT_SIZE};

/// In-memory table for recent writes
///
/// Borrows the caller's buffer for its whole lifetime; every key, value and
/// index slot is carved out of it. Mutations go to the WAL first.
#[derive(Debug)]
pub struct MemTable<'a> {
    /// Backing storage for slots and key/value bytes
    arena: Arena<'a>,
    /// Region of the arena holding `capacity` encoded slots
    slots: Span,
    /// Fixed number of slots
    capacity: usize,
    /// Occupied slots; `slots[0..count]` is sorted by key
    count: usize,
    /// Write-ahead log for durability
    wal: WalWriter,
    /// What the replay at open found
    recovery: RecoveryResult,
    /// Set once the arena is exhausted or the WAL is poisoned; writes are
    /// refused afterwards
    unusable: bool,
}

impl<'a> MemTable<'a> {
    /// Open a MemTable over `buffer` with the given config
    ///
    /// On startup:
    /// 1. Initialize the arena over `buffer`
    /// 2. Carve the slot array out of the arena
    /// 3. Open/create the WAL for read and append
    /// 4. Replay the WAL into the index
    pub fn open(buffer: &'a mut [u8], config: &Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Arena over the caller's buffer
        let mut arena = Arena::new(buffer)?;

        // Step 2: Fixed slot array
        let slot_bytes = config.capacity.checked_mul(SLOT_SIZE).ok_or_else(|| {
            MemWalError::Config(format!("capacity {} is too large", config.capacity))
        })?;
        let slots = arena.allocate(slot_bytes)?;

        // Step 3: Open the log; the reader handle shares the same open file
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&config.wal_path)?;
        let replay_handle = file.try_clone()?;
        let wal = WalWriter::from_file(file, config.wal_sync_strategy)?;

        let mut table = Self {
            arena,
            slots,
            capacity: config.capacity,
            count: 0,
            wal,
            recovery: RecoveryResult::default(),
            unusable: false,
        };

        // Step 4: Replay without re-logging
        let replay = PutOptions { skip_log: true };
        let recovery = WalRecovery::replay(&replay_handle, config.torn_tail_policy, |record| {
            table.put_with(&record.key, &record.value, replay)
        })?;
        if recovery.was_truncated {
            table.wal.refresh_len()?;
        }
        table.recovery = recovery;

        info!(
            path = %config.wal_path.display(),
            records = recovery.records_replayed,
            entries = table.count,
            truncated = recovery.was_truncated,
            "MemTable opened"
        );
        debug!(
            arena_used = table.arena.used(),
            arena_capacity = table.arena.capacity(),
            "arena usage after replay"
        );

        Ok(table)
    }

    /// Open with a WAL path (convenience method)
    ///
    /// Uses default config with the specified log path
    pub fn open_path(buffer: &'a mut [u8], wal_path: &Path) -> Result<Self> {
        let config = Config::builder().wal_path(wal_path).build();
        Self::open(buffer, &config)
    }

    /// Put a key-value pair, logging it first
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.put_with(key, value, PutOptions::default())
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Locate the key
    /// 2. Refuse a new key when every slot is taken
    /// 3. Copy the bytes into the arena
    /// 4. Append to the WAL (unless `skip_log`)
    /// 5. Overwrite the slot, or shift and insert
    pub fn put_with(&mut self, key: &[u8], value: &[u8], options: PutOptions) -> Result<()> {
        if self.unusable || self.wal.is_poisoned() {
            return Err(MemWalError::Unusable);
        }

        // Step 1: Find position
        let (pos, found) = self.search(key);

        // Step 2: Capacity only matters if the table would grow
        if !found && self.count == self.capacity {
            return Err(MemWalError::MemTableFull {
                capacity: self.capacity,
            });
        }

        // Step 3: Copy into the arena. An existing slot keeps its key copy.
        let needed = value.len() + if found { 0 } else { key.len() };
        if needed > self.arena.remaining() {
            return Err(self.exhausted(needed));
        }
        let key_span = if found {
            self.slot(pos).key
        } else {
            self.arena.duplicate(key)?
        };
        let value_span = self.arena.duplicate(value)?;

        // Step 4: Log before apply
        if !options.skip_log {
            if let Err(e) = self.wal.append(key, value) {
                if self.wal.is_poisoned() {
                    self.unusable = true;
                    error!(
                        error = %e,
                        entries = self.count,
                        "WAL state unknown; MemTable no longer accepts writes"
                    );
                }
                return Err(e);
            }
        }

        // Step 5: Mutate the index
        let slot = Slot {
            key: key_span,
            value: value_span,
        };
        if !found {
            let region = self.arena.get_mut(self.slots);
            region.copy_within(pos * SLOT_SIZE..self.count * SLOT_SIZE, (pos + 1) * SLOT_SIZE);
            self.count += 1;
        }
        self.set_slot(pos, slot);

        trace!(
            key_len = key.len(),
            value_len = value.len(),
            pos,
            overwrite = found,
            count = self.count,
            "put"
        );
        Ok(())
    }

    /// Copy the value for `key` into `out`
    ///
    /// Returns the filled prefix of `out`, or `None` if the key is absent.
    /// Fails with `BufferTooSmall` if `out` cannot hold the value.
    pub fn get<'b>(&self, key: &[u8], out: &'b mut [u8]) -> Result<Option<&'b [u8]>> {
        let Some(value) = self.get_ref(key) else {
            return Ok(None);
        };
        if out.len() < value.len() {
            return Err(MemWalError::BufferTooSmall {
                needed: value.len(),
                available: out.len(),
            });
        }

        let filled = &mut out[..value.len()];
        filled.copy_from_slice(value);
        Ok(Some(&*filled))
    }

    /// Borrow the value for `key` straight from the arena
    pub fn get_ref(&self, key: &[u8]) -> Option<&[u8]> {
        let (pos, found) = self.search(key);
        found.then(|| self.arena.get(self.slot(pos).value))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.search(key).1
    }

    /// Iterate over entries in ascending key order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            next: 0,
        }
    }

    /// Force buffered WAL data to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.wal.sync()
    }

    /// Close the table, syncing the WAL
    pub fn close(mut self) -> Result<()> {
        self.wal.sync()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of entries
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fixed number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a new key would be rejected
    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Arena bytes in use (slot array included)
    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }

    pub fn arena_remaining(&self) -> usize {
        self.arena.remaining()
    }

    /// What the WAL replay at open found
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Records appended to the WAL since open (replay excluded)
    pub fn wal_records_written(&self) -> u64 {
        self.wal.records_written()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Lower-bound binary search over `slots[0..count]`
    ///
    /// Returns the first position whose key is `>= key` and whether that key
    /// is an exact match.
    fn search(&self, key: &[u8]) -> (usize, bool) {
        let (mut lo, mut hi) = (0, self.count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid) < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let found = lo < self.count && self.key_at(lo) == key;
        (lo, found)
    }

    fn key_at(&self, pos: usize) -> &[u8] {
        self.arena.get(self.slot(pos).key)
    }

    fn slot(&self, pos: usize) -> Slot {
        let start = pos * SLOT_SIZE;
        Slot::decode(&self.arena.get(self.slots)[start..start + SLOT_SIZE])
    }

    fn set_slot(&mut self, pos: usize, slot: Slot) {
        let start = pos * SLOT_SIZE;
        slot.encode(&mut self.arena.get_mut(self.slots)[start..start + SLOT_SIZE]);
    }

    fn exhausted(&mut self, requested: usize) -> MemWalError {
        self.unusable = true;
        let remaining = self.arena.remaining();
        error!(
            requested,
            remaining,
            entries = self.count,
            "arena exhausted; MemTable no longer accepts writes"
        );
        MemWalError::OutOfArenaSpace {
            requested,
            remaining,
        }
    }
}

/// Iterator over MemTable entries in key order
pub struct Iter<'t> {
    table: &'t MemTable<'t>,
    next: usize,
}

impl<'t> Iterator for Iter<'t> {
    type Item = (&'t [u8], &'t [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.count {
            return None;
        }
        let slot = self.table.slot(self.next);
        self.next += 1;
        Some((self.table.arena.get(slot.key), self.table.arena.get(slot.value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.table.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'t, 'a> IntoIterator for &'t MemTable<'a> {
    type Item = (&'t [u8], &'t [u8]);
    type IntoIter = Iter<'t>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
