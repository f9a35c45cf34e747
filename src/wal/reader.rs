//! WAL Reader
//!
//! Handles reading records sequentially from the WAL file.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use bytes::Buf;

use crate::error::{MemWalError, Result};

use super::{WalRecord, LENGTH_PREFIX_SIZE};

/// Reads records from a WAL byte stream
pub struct WalReader<R = File> {
    reader: BufReader<R>,
    /// Offset just past the last complete record
    position: u64,
}

impl WalReader<File> {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> WalReader<R> {
    /// Read from `inner`, starting at its current position
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            position: 0,
        }
    }

    /// Read the next record from the WAL
    ///
    /// - `Ok(Some(_))`: a complete record
    /// - `Ok(None)`: end of stream exactly at a record boundary
    /// - `Err(TornRecord)`: end of stream in the middle of a record
    pub fn next_record(&mut self) -> Result<Option<WalRecord>> {
        if self.reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let start = self.position;
        let key = self.read_field(start)?;
        let value = self.read_field(start)?;

        self.position += WalRecord::encoded_len_of(key.len(), value.len()) as u64;
        Ok(Some(WalRecord { key, value }))
    }

    /// Offset just past the last complete record read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over the remaining records
    pub fn records(self) -> WalIterator<R> {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    fn read_field(&mut self, record_start: u64) -> Result<Vec<u8>> {
        let torn = |e: io::Error| match e.kind() {
            io::ErrorKind::UnexpectedEof => MemWalError::TornRecord {
                offset: record_start,
            },
            _ => MemWalError::Io(e),
        };

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.reader.read_exact(&mut prefix).map_err(torn)?;
        let len = (&prefix[..]).get_u32_le() as usize;

        // A garbage length in a torn tail must not turn into a huge allocation
        let mut field = Vec::new();
        (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut field)
            .map_err(torn)?;
        if field.len() < len {
            return Err(MemWalError::TornRecord {
                offset: record_start,
            });
        }
        Ok(field)
    }
}

/// Iterator over WAL records
///
/// Yields the error once and then stops.
pub struct WalIterator<R = File> {
    reader: WalReader<R>,
    done: bool,
}

impl<R: Read> Iterator for WalIterator<R> {
    type Item = Result<WalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn log_of(records: &[(&[u8], &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        for (key, value) in records {
            WalRecord::encode(key, value, &mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = WalReader::new(Cursor::new(Vec::new()));
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn reads_records_in_order() {
        let bytes = log_of(&[(b"a", b"1"), (b"bb", b"22")]);
        let total = bytes.len() as u64;
        let mut reader = WalReader::new(Cursor::new(bytes));

        assert_eq!(reader.next_record().unwrap(), Some(WalRecord::new(*b"a", *b"1")));
        assert_eq!(reader.position(), 10);
        assert_eq!(reader.next_record().unwrap(), Some(WalRecord::new(*b"bb", *b"22")));
        assert_eq!(reader.position(), total);
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn torn_record_reports_its_start() {
        let mut bytes = log_of(&[(b"a", b"1")]);
        bytes.extend_from_slice(&[5, 0, 0, 0, b'x']);
        let mut reader = WalReader::new(Cursor::new(bytes));

        reader.next_record().unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, MemWalError::TornRecord { offset: 10 }));
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn huge_garbage_length_is_torn() {
        let bytes = vec![0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        let mut reader = WalReader::new(Cursor::new(bytes));

        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, MemWalError::TornRecord { offset: 0 }));
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut bytes = log_of(&[(b"a", b"1"), (b"b", b"2")]);
        bytes.push(7);
        let mut records = WalReader::new(Cursor::new(bytes)).records();

        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }
}
