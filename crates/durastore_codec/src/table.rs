//! Row-addressable storage.

use crate::error::{CodecError, CodecResult};

/// Storage addressed by absolute row index, with a fixed row length.
///
/// Buffers passed to the `*_rows` methods hold a whole number of rows.
/// Implementations never write or return a partial row.
pub trait Table {
    /// Error returned by the table's I/O.
    ///
    /// Codec errors must convert into it so the row operations can report
    /// length problems through the same channel.
    type Error: From<CodecError>;

    /// Length of one row in bytes.
    fn row_len(&self) -> usize;

    /// Writes one row.
    fn write_row(&mut self, row: u64, buf: &[u8]) -> Result<(), Self::Error>;

    /// Writes consecutive rows starting at `start`.
    fn write_rows(&mut self, start: u64, buf: &[u8]) -> Result<(), Self::Error>;

    /// Reads one row into `buf`.
    fn read_row(&self, row: u64, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Reads consecutive rows starting at `start` into `buf`.
    fn read_rows(&self, start: u64, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// An in-memory table.
///
/// Grows as rows are written; reading a row that was never reached is an
/// error.
///
/// # Example
///
/// ```rust
/// use durastore_codec::{MemoryTable, Table};
///
/// let mut table = MemoryTable::new(4);
/// table.write_row(2, b"abcd").unwrap();
/// assert_eq!(table.rows(), 3);
///
/// let mut buf = [0u8; 4];
/// table.read_row(2, &mut buf).unwrap();
/// assert_eq!(&buf, b"abcd");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTable {
    row_len: usize,
    data: Vec<u8>,
}

impl MemoryTable {
    /// Creates an empty table with rows of `row_len` bytes.
    #[must_use]
    pub fn new(row_len: usize) -> Self {
        Self {
            row_len,
            data: Vec::new(),
        }
    }

    /// Returns the number of rows currently held.
    #[must_use]
    pub fn rows(&self) -> u64 {
        if self.row_len == 0 {
            return 0;
        }
        (self.data.len() / self.row_len) as u64
    }

    /// Returns a copy of the raw table bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn span(&self, start: u64, len: usize) -> CodecResult<(usize, usize)> {
        if self.row_len == 0 {
            return Err(CodecError::invalid_table("row length is zero"));
        }
        if len % self.row_len != 0 {
            return Err(CodecError::LengthMismatch {
                expected: len.div_ceil(self.row_len) * self.row_len,
                actual: len,
            });
        }
        usize::try_from(start)
            .ok()
            .and_then(|s| s.checked_mul(self.row_len))
            .and_then(|offset| Some((offset, offset.checked_add(len)?)))
            .ok_or_else(|| CodecError::RowOutOfRange {
                row: start,
                rows: self.rows(),
            })
    }
}

impl Table for MemoryTable {
    type Error = CodecError;

    fn row_len(&self) -> usize {
        self.row_len
    }

    fn write_row(&mut self, row: u64, buf: &[u8]) -> CodecResult<()> {
        if buf.len() != self.row_len {
            return Err(CodecError::LengthMismatch {
                expected: self.row_len,
                actual: buf.len(),
            });
        }
        self.write_rows(row, buf)
    }

    fn write_rows(&mut self, start: u64, buf: &[u8]) -> CodecResult<()> {
        let (begin, end) = self.span(start, buf.len())?;
        if end > self.data.len() {
            self.data
                .try_reserve_exact(end - self.data.len())
                .map_err(|_| CodecError::RowOutOfRange {
                    row: start,
                    rows: self.rows(),
                })?;
            self.data.resize(end, 0);
        }
        self.data[begin..end].copy_from_slice(buf);
        Ok(())
    }

    fn read_row(&self, row: u64, buf: &mut [u8]) -> CodecResult<()> {
        if buf.len() != self.row_len {
            return Err(CodecError::LengthMismatch {
                expected: self.row_len,
                actual: buf.len(),
            });
        }
        self.read_rows(row, buf)
    }

    fn read_rows(&self, start: u64, buf: &mut [u8]) -> CodecResult<()> {
        let (begin, end) = self.span(start, buf.len())?;
        if end > self.data.len() {
            let last = start.saturating_add((buf.len() / self.row_len) as u64);
            return Err(CodecError::RowOutOfRange {
                row: last.saturating_sub(1),
                rows: self.rows(),
            });
        }
        buf.copy_from_slice(&self.data[begin..end]);
        Ok(())
    }
}
