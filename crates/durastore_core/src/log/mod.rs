//! Replicated append-only line log.
//!
//! The registry persists its entries through this log. Each replica file
//! holds the same sequence of framed lines:
//!
//! ```text
//! | crc32 of text (8 hex) | ' ' | text | '\n' |
//! ```
//!
//! ## Recovery Policy
//!
//! - A replica's valid content is its longest prefix of well-formed lines;
//!   a torn or corrupt line ends it.
//! - On open, the valid lines of all replicas are merged and every replica
//!   is rewritten to the merged content, so a torn tail is truncated before
//!   anything is appended after it.
//! - A replica that fails an append is retired until the next open.
//! - The reader uses the replica with the longest valid prefix.
//! - Unreadable replicas count against the failure tolerance.
//!
//! ## Invariants
//!
//! - The log is **append-only**; lines are never rewritten
//! - An append returns only after every live replica has been written
//!   (and synced, when configured)
//! - An append fails if more replicas than tolerated missed it

mod line;
mod logger;
mod reader;

pub use logger::Logger;
pub use reader::LineReader;

use crate::error::CoreResult;

/// An append-only store of text lines.
///
/// [`Logger`] is the file-backed implementation; the registry only
/// depends on this trait.
pub trait LineLog: Send + Sync {
    /// Returns a reader positioned at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is closed or cannot be read.
    fn reader(&self, offset: u64) -> CoreResult<LineReader>;

    /// Appends one line. The line is durable when this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is invalid or the append did not reach
    /// enough replicas.
    fn println(&mut self, text: &str) -> CoreResult<()>;

    /// Closes the log. Later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the underlying files fails.
    fn close(&mut self) -> CoreResult<()>;
}
