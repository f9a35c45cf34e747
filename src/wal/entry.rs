//! WAL record definitions
//!
//! Defines the on-disk encoding of a single logged `put`.

use bytes::{Buf, BufMut};

use crate::error::{MemWalError, Result};

/// Size of each length prefix in a record
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// A single logged mutation: the key and the value it was set to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl WalRecord {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encoded size of a record with the given field lengths
    pub fn encoded_len_of(key_len: usize, value_len: usize) -> usize {
        2 * LENGTH_PREFIX_SIZE + key_len + value_len
    }

    /// Encoded size of this record
    pub fn encoded_len(&self) -> usize {
        Self::encoded_len_of(self.key.len(), self.value.len())
    }

    /// Encode borrowed fields into `buf`
    ///
    /// Nothing is written if either field is too long for its `u32` prefix.
    pub fn encode(key: &[u8], value: &[u8], buf: &mut impl BufMut) -> Result<()> {
        let key_len = length_prefix(key)?;
        let value_len = length_prefix(value)?;

        buf.put_u32_le(key_len);
        buf.put_slice(key);
        buf.put_u32_le(value_len);
        buf.put_slice(value);
        Ok(())
    }

    /// Serialize to a freshly allocated buffer
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        Self::encode(&self.key, &self.value, &mut buf)?;
        Ok(buf)
    }

    /// Decode one record from the front of `bytes`
    ///
    /// Returns the record and the number of bytes consumed. Input that ends
    /// before the record is complete yields [`MemWalError::TornRecord`] at
    /// offset 0.
    pub fn deserialize(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut buf = bytes;
        let key = take_field(&mut buf)?;
        let value = take_field(&mut buf)?;
        let consumed = bytes.len() - buf.remaining();
        Ok((Self { key, value }, consumed))
    }
}

fn length_prefix(field: &[u8]) -> Result<u32> {
    u32::try_from(field.len()).map_err(|_| MemWalError::RecordTooLarge { len: field.len() })
}

fn take_field(buf: &mut &[u8]) -> Result<Vec<u8>> {
    if buf.remaining() < LENGTH_PREFIX_SIZE {
        return Err(MemWalError::TornRecord { offset: 0 });
    }
    let len = buf.get_u32_le() as usize;
    if buf.remaining() < len {
        return Err(MemWalError::TornRecord { offset: 0 });
    }
    let field = buf[..len].to_vec();
    buf.advance(len);
    Ok(field)
}
