//! Sequential line reader.

use crate::error::{CoreError, CoreResult};
use std::collections::VecDeque;

/// Reads validated lines from a log, in append order.
///
/// `None` from [`LineReader::scan_line`] is the end-of-stream signal. A
/// torn or corrupt tail ends the stream rather than failing it.
#[derive(Debug, Default)]
pub struct LineReader {
    lines: VecDeque<String>,
    offset: u64,
}

impl LineReader {
    /// Creates a reader over already-validated lines.
    ///
    /// `offset` is the byte position of the first line in the log.
    #[must_use]
    pub fn from_lines(lines: Vec<String>, offset: u64) -> Self {
        Self {
            lines: lines.into(),
            offset,
        }
    }

    /// Returns the next line, or `None` at the end of the log.
    ///
    /// # Errors
    ///
    /// Never fails for an in-memory reader; the signature leaves room for
    /// readers that stream from disk.
    pub fn scan_line(&mut self) -> CoreResult<Option<String>> {
        let Some(line) = self.lines.pop_front() else {
            return Ok(None);
        };
        self.offset += (super::line::FRAME_OVERHEAD + line.len() + 1) as u64;
        Ok(Some(line))
    }

    /// Returns the next `<id> <name>` entry, or `None` at the end of the log.
    ///
    /// # Errors
    ///
    /// Returns `LogParse` if the line is not exactly an unsigned id followed
    /// by one name.
    pub fn scan_entry(&mut self) -> CoreResult<Option<(u32, String)>> {
        let Some(line) = self.scan_line()? else {
            return Ok(None);
        };

        let mut parts = line.split_whitespace();
        let entry = match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(name), None) => id.parse::<u32>().ok().map(|id| (id, name.to_string())),
            _ => None,
        };
        entry
            .map(Some)
            .ok_or_else(|| CoreError::log_parse(line))
    }

    /// Returns the byte offset just past the last line returned.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the number of lines not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}
