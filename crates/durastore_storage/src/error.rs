//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// `BadData` and `ChecksumMismatch` describe a single replica and are
/// normally recovered by moving on to the next one. `TooManyFails` is what
/// callers see once the failure tolerance is used up.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A replica envelope is structurally invalid.
    #[error("bad data: {0}")]
    BadData(String),

    /// A replica envelope carries a CRC that does not match its payload.
    #[error("crc32 checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// The checksum stored in the envelope header.
        expected: u32,
        /// The checksum computed over the payload.
        actual: u32,
    },

    /// More replicas failed than the configured tolerance allows.
    #[error("too many failures: {fails} replica(s) failed, {allowed} allowed")]
    TooManyFails {
        /// Number of replicas that failed.
        fails: usize,
        /// Number of failures that were tolerated.
        allowed: usize,
    },

    /// An access started beyond the logical end of a chunked file.
    #[error("offset {offset} out of range (size {size})")]
    OutOfRange {
        /// The requested offset.
        offset: u64,
        /// The logical size of the file.
        size: u64,
    },

    /// Malformed construction parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The resource has already been closed.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Creates a bad data error.
    pub fn bad_data(message: impl Into<String>) -> Self {
        Self::BadData(message.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns true if this error only concerns one replica's contents.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::BadData(_) | Self::ChecksumMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corruption_is_content_damage_only() {
        assert!(StorageError::bad_data("torn header").is_corruption());
        assert!(StorageError::ChecksumMismatch {
            expected: 1,
            actual: 2
        }
        .is_corruption());
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!StorageError::from(missing).is_corruption());
        assert!(!StorageError::Closed.is_corruption());
    }
}
