//! Arena Allocator
//!
//! Bump allocator over one caller-supplied fixed buffer.
//!
//! ## Responsibilities
//! - Hand out zeroed byte ranges from the unused tail of the buffer
//! - Never free individual allocations (the owner is discarded as a unit)
//! - Report exhaustion as `OutOfArenaSpace`
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────┬──────────────────────┐
//! │ allocated (0..offset)        │ free (offset..len)   │
//! └──────────────────────────────┴──────────────────────┘
//!                                ▲
//!                          high-water mark
//! ```
//!
//! Allocations are addressed by [`Span`] handles rather than references so
//! the owner can keep many of them alive while still mutating the arena.

use crate::error::{MemWalError, Result};

/// Handle to an allocated byte range inside an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset from the start of the arena
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// Fixed-capacity bump allocator
pub struct Arena<'a> {
    /// Backing memory, owned by the caller for the arena's lifetime
    buf: &'a mut [u8],
    /// High-water mark: everything before it is allocated
    offset: usize,
}

impl<'a> Arena<'a> {
    /// Largest buffer a `Span` can address
    pub const MAX_SIZE: usize = u32::MAX as usize;

    /// Create an arena over `buf`
    ///
    /// Fails if the buffer is larger than [`Arena::MAX_SIZE`].
    pub fn new(buf: &'a mut [u8]) -> Result<Self> {
        if buf.len() > Self::MAX_SIZE {
            return Err(MemWalError::Config(format!(
                "arena buffer of {} bytes exceeds the {} byte limit",
                buf.len(),
                Self::MAX_SIZE
            )));
        }
        Ok(Self { buf, offset: 0 })
    }

    /// Allocate `size` zeroed bytes from the unused tail
    pub fn allocate(&mut self, size: usize) -> Result<Span> {
        let remaining = self.remaining();
        if size > remaining {
            return Err(MemWalError::OutOfArenaSpace {
                requested: size,
                remaining,
            });
        }

        let start = self.offset;
        self.offset += size;
        // The caller's buffer may hold anything
        self.buf[start..self.offset].fill(0);

        Ok(Span {
            offset: start as u32,
            len: size as u32,
        })
    }

    /// Copy `bytes` into newly allocated arena storage
    pub fn duplicate(&mut self, bytes: &[u8]) -> Result<Span> {
        let span = self.allocate(bytes.len())?;
        self.buf[span.range()].copy_from_slice(bytes);
        Ok(span)
    }

    /// Resolve a span to its bytes
    ///
    /// # Panics
    /// If `span` was not produced by this arena.
    pub fn get(&self, span: Span) -> &[u8] {
        &self.buf[span.range()]
    }

    /// Resolve a span to its bytes, mutably
    pub fn get_mut(&mut self, span: Span) -> &mut [u8] {
        &mut self.buf[span.range()]
    }

    /// Bytes handed out so far
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Total size of the backing buffer
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl std::fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("used", &self.offset)
            .field("capacity", &self.buf.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_advances_high_water_mark() {
        let mut buf = [0u8; 64];
        let mut arena = Arena::new(&mut buf).unwrap();

        let a = arena.allocate(10).unwrap();
        let b = arena.allocate(6).unwrap();

        assert_eq!(a, Span { offset: 0, len: 10 });
        assert_eq!(b, Span { offset: 10, len: 6 });
        assert_eq!(arena.used(), 16);
        assert_eq!(arena.remaining(), 48);
    }

    #[test]
    fn allocate_zeroes_dirty_buffer() {
        let mut buf = [0xAAu8; 16];
        let mut arena = Arena::new(&mut buf).unwrap();

        let span = arena.allocate(8).unwrap();
        assert_eq!(arena.get(span), &[0u8; 8]);
    }

    #[test]
    fn duplicate_copies_bytes() {
        let mut buf = [0u8; 32];
        let mut arena = Arena::new(&mut buf).unwrap();

        let mut source = b"hello".to_vec();
        let span = arena.duplicate(&source).unwrap();
        source[0] = b'j';

        assert_eq!(arena.get(span), b"hello");
    }

    #[test]
    fn exhaustion_is_reported_without_consuming() {
        let mut buf = [0u8; 8];
        let mut arena = Arena::new(&mut buf).unwrap();
        arena.allocate(5).unwrap();

        let err = arena.allocate(4).unwrap_err();
        assert!(matches!(
            err,
            MemWalError::OutOfArenaSpace { requested: 4, remaining: 3 }
        ));
        assert_eq!(arena.used(), 5);

        // The rest can still be handed out exactly
        arena.allocate(3).unwrap();
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn zero_sized_allocations() {
        let mut buf = [0u8; 0];
        let mut arena = Arena::new(&mut buf).unwrap();

        let span = arena.duplicate(b"").unwrap();
        assert!(span.is_empty());
        assert_eq!(arena.get(span), b"");
    }

    #[test]
    fn get_mut_writes_through() {
        let mut buf = [0u8; 8];
        let mut arena = Arena::new(&mut buf).unwrap();

        let span = arena.allocate(4).unwrap();
        arena.get_mut(span).copy_from_slice(b"abcd");
        assert_eq!(arena.get(span), b"abcd");
    }
}
