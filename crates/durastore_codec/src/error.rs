//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded bytes do not fill the destination slot exactly.
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Size of the slot (`row_len`, or `row_len × count`).
        expected: usize,
        /// Number of bytes the value encoded to.
        actual: usize,
    },

    /// Bytes were left over after every field was decoded.
    #[error("{remaining} trailing byte(s) after decoding row")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// The buffer ended before every field was decoded.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A boolean field held something other than 0 or 1.
    #[error("invalid boolean byte: {0:#04x}")]
    InvalidBool(u8),

    /// A row index lies outside the table.
    #[error("row {row} out of range (table has {rows} rows)")]
    RowOutOfRange {
        /// The requested row.
        row: u64,
        /// Number of rows in the table.
        rows: u64,
    },

    /// A multi-row request is larger than memory can address.
    #[error("{count} rows of {row_len} bytes overflow the address space")]
    SizeOverflow {
        /// Number of rows requested.
        count: usize,
        /// Size of one row.
        row_len: usize,
    },

    /// The table cannot hold rows of this shape.
    #[error("invalid table: {message}")]
    InvalidTable {
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Create an invalid table error.
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }
}
