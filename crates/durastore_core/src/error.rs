//! Error types for Durastore core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Durastore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] durastore_storage::StorageError),

    /// Row codec error.
    #[error("codec error: {0}")]
    Codec(#[from] durastore_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// More log replicas failed than the configured tolerance allows.
    #[error("too many failures: {fails} replica(s) failed, {allowed} allowed")]
    TooManyFails {
        /// Number of replicas that failed.
        fails: usize,
        /// Number of failures that were tolerated.
        allowed: usize,
    },

    /// A registry log line could not be parsed.
    #[error("malformed log line: {line:?}")]
    LogParse {
        /// The offending line.
        line: String,
    },

    /// A log line exceeds the configured maximum.
    #[error("line too long: {len} bytes, max {max}")]
    LineTooLong {
        /// Length of the rejected line.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A name cannot be stored in the registry.
    #[error("invalid name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Every id above the current base is taken.
    #[error("registry id space exhausted")]
    IdSpaceExhausted,

    /// Invalid argument.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// The log or registry has been closed.
    #[error("closed")]
    Closed,
}

impl CoreError {
    /// Creates a log parse error.
    pub fn log_parse(line: impl Into<String>) -> Self {
        Self::LogParse { line: line.into() }
    }

    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
