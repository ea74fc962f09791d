//! Row tables stored in a chunked file.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use durastore_codec::{CodecError, Table};
use durastore_storage::ChunkedFile;
use std::path::Path;

/// A fixed-capacity [`Table`] on top of a [`ChunkedFile`].
///
/// Row `i` occupies bytes `[i·row_len, (i+1)·row_len)` of the virtual
/// file, so a row may straddle two chunk files.
///
/// # Example
///
/// ```no_run
/// use durastore_codec::{impl_row, read_row, write_row, Row};
/// use durastore_core::{ChunkedTable, Config};
///
/// struct Sample {
///     at: u64,
///     value: f64,
/// }
///
/// impl_row!(Sample { at: u64, value: f64 });
///
/// let mut table = ChunkedTable::open("samples", Sample::ROW_LEN, 1_000_000, &Config::new()).unwrap();
/// write_row(&mut table, 42, &Sample { at: 1, value: 0.5 }).unwrap();
/// let back: Sample = read_row(&table, 42).unwrap();
/// ```
#[derive(Debug)]
pub struct ChunkedTable {
    file: ChunkedFile,
    row_len: usize,
}

impl ChunkedTable {
    /// Opens a table of `rows` rows of `row_len` bytes in directory `dir`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero row length or a size that
    /// overflows, or the chunked file's open error.
    pub fn open(
        dir: impl AsRef<Path>,
        row_len: usize,
        rows: u64,
        config: &Config,
    ) -> CoreResult<Self> {
        let total_size = rows
            .checked_mul(row_len as u64)
            .ok_or_else(|| CoreError::invalid_argument("table size overflows u64"))?;
        let file = ChunkedFile::open(dir, config.chunk_bits, total_size)?;
        Self::new(file, row_len)
    }

    /// Wraps an open chunked file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `row_len` is zero.
    pub fn new(file: ChunkedFile, row_len: usize) -> CoreResult<Self> {
        if row_len == 0 {
            return Err(CoreError::invalid_argument("row length must be positive"));
        }
        Ok(Self { file, row_len })
    }

    /// Returns the number of rows the table can hold.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.file.total_size() / self.row_len as u64
    }

    /// Returns the underlying chunked file.
    #[must_use]
    pub fn file(&self) -> &ChunkedFile {
        &self.file
    }

    /// Syncs all chunks to disk.
    ///
    /// # Errors
    ///
    /// Returns the chunked file's sync error.
    pub fn sync(&self) -> CoreResult<()> {
        Ok(self.file.sync()?)
    }

    /// Closes the underlying chunks. Later calls are no-ops.
    pub fn close(&mut self) {
        self.file.close();
    }

    /// Returns the byte offset of `start`, checking that `len` bytes of
    /// whole rows fit in the table.
    fn offset_of(&self, start: u64, len: usize) -> CoreResult<u64> {
        if len % self.row_len != 0 {
            return Err(CodecError::LengthMismatch {
                expected: len.div_ceil(self.row_len) * self.row_len,
                actual: len,
            }
            .into());
        }
        let count = (len / self.row_len) as u64;
        let capacity = self.capacity();
        match start.checked_add(count) {
            Some(end) if end <= capacity => Ok(start * self.row_len as u64),
            _ => Err(CodecError::RowOutOfRange {
                row: start.saturating_add(count.saturating_sub(1)),
                rows: capacity,
            }
            .into()),
        }
    }

    fn check_single(&self, len: usize) -> CoreResult<()> {
        if len != self.row_len {
            return Err(CodecError::LengthMismatch {
                expected: self.row_len,
                actual: len,
            }
            .into());
        }
        Ok(())
    }
}

impl Table for ChunkedTable {
    type Error = CoreError;

    fn row_len(&self) -> usize {
        self.row_len
    }

    fn write_row(&mut self, row: u64, buf: &[u8]) -> CoreResult<()> {
        self.check_single(buf.len())?;
        self.write_rows(row, buf)
    }

    fn write_rows(&mut self, start: u64, buf: &[u8]) -> CoreResult<()> {
        let offset = self.offset_of(start, buf.len())?;
        self.file.write_at(buf, offset)?;
        Ok(())
    }

    fn read_row(&self, row: u64, buf: &mut [u8]) -> CoreResult<()> {
        self.check_single(buf.len())?;
        self.read_rows(row, buf)
    }

    fn read_rows(&self, start: u64, buf: &mut [u8]) -> CoreResult<()> {
        let offset = self.offset_of(start, buf.len())?;
        self.file.read_at(buf, offset)?;
        Ok(())
    }
}
