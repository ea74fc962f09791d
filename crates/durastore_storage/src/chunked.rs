//! A large virtual file stored as a directory of fixed-size chunk files.
//!
//! ```text
//! <dir>/
//! ├─ 0     # bytes [0, 2^bits)
//! ├─ 1     # bytes [2^bits, 2·2^bits)
//! ├─ ...
//! └─ a     # chunk 10; names are base-36 indexes
//! ```
//!
//! Every chunk is addressed as full-size. The last one may be short or
//! sparse on disk; unwritten bytes read back as zero.

use crate::error::{StorageError, StorageResult};
use crate::pio;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Chunk size exponent used when zero is passed to [`ChunkedFile::open`].
pub const DEFAULT_CHUNK_BITS: u32 = 26;

/// Largest accepted chunk size exponent.
pub const MAX_CHUNK_BITS: u32 = 32;

/// A virtual file of fixed logical size made of `2^chunk_bits`-byte chunks.
///
/// # Thread Safety
///
/// Reads and writes take `&self` and use positional I/O, so concurrent
/// non-overlapping accesses are fine. An access spanning several chunks is
/// not atomic as a whole; overlapping access must be serialised by the
/// caller.
///
/// # Example
///
/// ```no_run
/// use durastore_storage::ChunkedFile;
///
/// let file = ChunkedFile::open("big.data", 20, 10 << 20).unwrap();
/// file.write_at(b"spans two chunks", (1 << 20) - 4).unwrap();
///
/// let mut buf = [0u8; 16];
/// file.read_at(&mut buf, (1 << 20) - 4).unwrap();
/// assert_eq!(&buf, b"spans two chunks");
/// ```
#[derive(Debug)]
pub struct ChunkedFile {
    dir: PathBuf,
    chunk_bits: u32,
    total_size: u64,
    chunks: Vec<Option<File>>,
    closed: bool,
}

impl ChunkedFile {
    /// Opens (or creates) a chunked file in `dir`.
    ///
    /// `chunk_bits == 0` selects [`DEFAULT_CHUNK_BITS`]. Exactly
    /// `ceil(total_size / 2^chunk_bits)` chunk files are opened up front,
    /// creating any that do not exist.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `chunk_bits` exceeds [`MAX_CHUNK_BITS`],
    /// or an I/O error if the directory or a chunk cannot be opened.
    pub fn open(dir: impl AsRef<Path>, chunk_bits: u32, total_size: u64) -> StorageResult<Self> {
        if chunk_bits > MAX_CHUNK_BITS {
            return Err(StorageError::invalid_argument(format!(
                "chunk bits {chunk_bits} exceeds {MAX_CHUNK_BITS}"
            )));
        }
        let chunk_bits = if chunk_bits == 0 {
            DEFAULT_CHUNK_BITS
        } else {
            chunk_bits
        };

        let dir = dir.as_ref();
        match fs::create_dir(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let count = total_size.div_ceil(1u64 << chunk_bits);
        let mut chunks = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        for index in 0..count {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(dir.join(chunk_name(index)))?;
            chunks.push(Some(file));
        }

        debug!(dir = %dir.display(), chunk_bits, total_size, chunks = count, "chunked file opened");

        Ok(Self {
            dir: dir.to_path_buf(),
            chunk_bits,
            total_size,
            chunks,
            closed: false,
        })
    }

    /// Reads `buf.len()` bytes starting at `off`.
    ///
    /// Returns the number of bytes read, which is always `buf.len()`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `off` is beyond the logical size or the
    /// request runs past the last chunk. A zero-length read at exactly the
    /// logical size succeeds.
    pub fn read_at(&self, buf: &mut [u8], off: u64) -> StorageResult<usize> {
        self.check_range(off, buf.len())?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.read_span(buf, off)
    }

    /// Writes all of `buf` starting at `off`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Same range rules as [`ChunkedFile::read_at`]; no I/O happens when
    /// the range is rejected.
    pub fn write_at(&self, buf: &[u8], off: u64) -> StorageResult<usize> {
        self.check_range(off, buf.len())?;
        if buf.is_empty() {
            return Ok(0);
        }
        self.write_span(buf, off)
    }

    /// Syncs every chunk's data to disk.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after [`ChunkedFile::close`], or the first sync
    /// error.
    pub fn sync(&self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        for file in self.chunks.iter().flatten() {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Closes every chunk handle. Calling this again is a no-op.
    pub fn close(&mut self) {
        for chunk in &mut self.chunks {
            chunk.take();
        }
        self.closed = true;
    }

    /// Returns the directory holding the chunks.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the chunk size exponent in effect.
    #[must_use]
    pub fn chunk_bits(&self) -> u32 {
        self.chunk_bits
    }

    /// Returns the size of one chunk in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> u64 {
        1u64 << self.chunk_bits
    }

    /// Returns the declared logical size.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Returns the number of chunk files.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true after [`ChunkedFile::close`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn capacity(&self) -> u64 {
        (self.chunks.len() as u64) << self.chunk_bits
    }

    fn check_range(&self, off: u64, len: usize) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::Closed);
        }
        let out_of_range = StorageError::OutOfRange {
            offset: off,
            size: self.total_size,
        };
        if off > self.total_size {
            return Err(out_of_range);
        }
        if len == 0 {
            return Ok(());
        }
        match off.checked_add(len as u64) {
            Some(end) if end <= self.capacity() => Ok(()),
            _ => Err(out_of_range),
        }
    }

    /// Locates the chunk owning `off`: its file, the offset inside it, and
    /// the bytes left before the next chunk boundary.
    fn locate(&self, off: u64) -> StorageResult<(&File, u64, u64)> {
        let index = usize::try_from(off >> self.chunk_bits).map_err(|_| {
            StorageError::OutOfRange {
                offset: off,
                size: self.total_size,
            }
        })?;
        let file = self
            .chunks
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(StorageError::Closed)?;
        let within = off & (self.chunk_size() - 1);
        Ok((file, within, self.chunk_size() - within))
    }

    fn read_span(&self, buf: &mut [u8], off: u64) -> StorageResult<usize> {
        let (file, within, remaining) = self.locate(off)?;
        if buf.len() as u64 <= remaining {
            return Ok(pio::read_full_at(file, buf, within)?);
        }

        // buf is longer than `remaining`, so the split point fits in usize.
        let (head, tail) = buf.split_at_mut(remaining as usize);
        let n = pio::read_full_at(file, head, within)?;
        Ok(n + self.read_span(tail, off + remaining)?)
    }

    fn write_span(&self, buf: &[u8], off: u64) -> StorageResult<usize> {
        let (file, within, remaining) = self.locate(off)?;
        if buf.len() as u64 <= remaining {
            return Ok(pio::write_all_at(file, buf, within)?);
        }

        let (head, tail) = buf.split_at(remaining as usize);
        let n = pio::write_all_at(file, head, within)?;
        Ok(n + self.write_span(tail, off + remaining)?)
    }
}

/// Returns the file name of chunk `index`: its base-36 representation.
#[must_use]
pub fn chunk_name(mut index: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if index == 0 {
        return "0".to_string();
    }
    let mut name = Vec::new();
    while index > 0 {
        name.push(DIGITS[(index % 36) as usize]);
        index /= 36;
    }
    name.reverse();
    name.into_iter().map(char::from).collect()
}
