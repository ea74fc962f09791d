//! Replicated append-only line log.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::log::line::{frame, merge_lines, parse_prefix};
use crate::log::reader::LineReader;
use crate::log::LineLog;
use durastore_storage::ReplicaSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// An append-only text log written identically to every replica.
///
/// Opening reconciles the replicas: torn tails are cut off and lines a
/// replica missed while it was unreachable are copied in from the others.
/// Appends then go to every live replica; a replica whose append fails is
/// retired until the next open, so the live replicas never diverge.
pub struct Logger {
    replicas: ReplicaSet,
    line_max: usize,
    allow_fails: usize,
    sync_on_write: bool,
    closed: bool,
}

impl Logger {
    /// Opens the log over `files`, syncing every append.
    ///
    /// # Errors
    ///
    /// Returns an error if more than `allow_fails` replicas cannot be opened.
    pub fn open_ex<P: AsRef<Path>>(
        files: &[P],
        line_max: usize,
        allow_fails: usize,
    ) -> CoreResult<Self> {
        let config = Config::new().line_max(line_max).allow_fails(allow_fails);
        Self::open_with_config(files, &config)
    }

    /// Opens the log over `files` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if more than `config.allow_fails` replicas cannot be
    /// opened, read or repaired.
    pub fn open_with_config<P: AsRef<Path>>(files: &[P], config: &Config) -> CoreResult<Self> {
        let replicas = ReplicaSet::open(files, config.allow_fails)?;
        let mut log = Self {
            replicas,
            line_max: config.line_max,
            allow_fails: config.allow_fails,
            sync_on_write: config.sync_on_write,
            closed: false,
        };
        log.reconcile()?;
        Ok(log)
    }

    /// Returns the logical log size: the largest replica size.
    ///
    /// # Errors
    ///
    /// Returns an error if more than `allow_fails` replicas cannot be stat'ed.
    pub fn size(&self) -> CoreResult<u64> {
        if self.closed {
            return Err(CoreError::Closed);
        }
        Ok(self.replicas.fsize(self.allow_fails)?)
    }

    /// Returns the number of live replicas.
    #[must_use]
    pub fn live_replicas(&self) -> usize {
        self.replicas.live_count()
    }

    /// Rewrites every live replica to the merged content of all of them.
    ///
    /// The most complete replica (longest valid prefix) sets the order;
    /// lines only other replicas hold are appended after it. Each replica
    /// keeps the bytes it shares with the result and is rewritten from
    /// there, which drops a torn tail.
    fn reconcile(&mut self) -> CoreResult<()> {
        let mut fails = self.replicas.len() - self.replicas.live_count();
        let mut images = Vec::new();

        for index in 0..self.replicas.len() {
            let Some(file) = self.replicas.file_mut(index) else {
                continue;
            };
            match read_from(file, 0) {
                Ok(bytes) => {
                    let (lines, consumed) = parse_prefix(&bytes, self.line_max);
                    images.push(ReplicaImage {
                        index,
                        bytes,
                        lines,
                        consumed,
                    });
                }
                Err(e) => {
                    let path = self.replicas.paths()[index].display();
                    warn!(path = %path, error = %e, "cannot read log replica");
                    self.replicas.retire(index);
                    fails += 1;
                }
            }
        }
        self.check_fails(fails)?;

        // Stable sort: ties keep slot order.
        images.sort_by(|a, b| b.consumed.cmp(&a.consumed));
        let lists: Vec<&[String]> = images.iter().map(|i| i.lines.as_slice()).collect();
        let merged = merge_lines(&lists);
        let target: Vec<u8> = merged.iter().flat_map(|line| frame(line)).collect();

        for image in &images {
            if image.bytes == target {
                continue;
            }
            let path = self.replicas.paths()[image.index].display().to_string();
            let Some(file) = self.replicas.file_mut(image.index) else {
                continue;
            };
            match rewrite(file, &image.bytes, &target, self.sync_on_write) {
                Ok(()) => info!(
                    path = %path,
                    valid = image.consumed,
                    found = image.bytes.len(),
                    repaired = target.len(),
                    "log replica repaired"
                ),
                Err(e) => {
                    warn!(path = %path, error = %e, "cannot repair log replica");
                    self.replicas.retire(image.index);
                    fails += 1;
                }
            }
        }
        self.check_fails(fails)?;

        debug!(
            lines = merged.len(),
            bytes = target.len(),
            live = self.replicas.live_count(),
            "log reconciled"
        );
        Ok(())
    }

    fn check_fails(&self, fails: usize) -> CoreResult<()> {
        if fails > self.allow_fails {
            return Err(CoreError::TooManyFails {
                fails,
                allowed: self.allow_fails,
            });
        }
        Ok(())
    }
}

/// One replica's content as found on open.
struct ReplicaImage {
    index: usize,
    bytes: Vec<u8>,
    lines: Vec<String>,
    consumed: usize,
}

impl LineLog for Logger {
    fn reader(&self, offset: u64) -> CoreResult<LineReader> {
        if self.closed {
            return Err(CoreError::Closed);
        }

        let mut best: Option<(Vec<String>, usize)> = None;
        let mut fails = self.replicas.len() - self.replicas.live_count();

        for (path, file) in self.replicas.live() {
            let bytes = match read_from(file, offset) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read log replica");
                    fails += 1;
                    continue;
                }
            };
            let (lines, consumed) = parse_prefix(&bytes, self.line_max);
            if consumed < bytes.len() {
                warn!(
                    path = %path.display(),
                    valid = consumed,
                    total = bytes.len(),
                    "log replica has an invalid tail"
                );
            }
            if best.as_ref().map_or(true, |(_, c)| consumed > *c) {
                best = Some((lines, consumed));
            }
        }

        self.check_fails(fails)?;

        let (lines, consumed) = best.unwrap_or_default();
        debug!(offset, lines = lines.len(), bytes = consumed, "log read");
        Ok(LineReader::from_lines(lines, offset))
    }

    fn println(&mut self, text: &str) -> CoreResult<()> {
        if self.closed {
            return Err(CoreError::Closed);
        }
        if text.len() > self.line_max {
            return Err(CoreError::LineTooLong {
                len: text.len(),
                max: self.line_max,
            });
        }
        if text.contains('\n') {
            return Err(CoreError::invalid_argument("log line contains a newline"));
        }

        let line = frame(text);
        let sync = self.sync_on_write;
        let mut fails = self.replicas.len() - self.replicas.live_count();

        for index in 0..self.replicas.len() {
            let Some(file) = self.replicas.file_mut(index) else {
                continue;
            };
            if let Err(e) = append_to(file, &line, sync) {
                let path = self.replicas.paths()[index].display();
                warn!(path = %path, error = %e, "log append failed");
                self.replicas.retire(index);
                fails += 1;
            }
        }

        self.check_fails(fails)
    }

    fn close(&mut self) -> CoreResult<()> {
        if !self.closed {
            self.replicas.close();
            self.closed = true;
            debug!("log closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("replicas", &self.replicas.paths())
            .field("line_max", &self.line_max)
            .field("allow_fails", &self.allow_fails)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn read_from(mut file: &File, offset: u64) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(offset))?;
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn rewrite(file: &mut File, current: &[u8], target: &[u8], sync: bool) -> std::io::Result<()> {
    let common = current
        .iter()
        .zip(target)
        .take_while(|(a, b)| a == b)
        .count();
    file.set_len(common as u64)?;
    file.seek(SeekFrom::Start(common as u64))?;
    file.write_all(&target[common..])?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

fn append_to(file: &mut File, line: &[u8], sync: bool) -> std::io::Result<()> {
    file.seek(SeekFrom::End(0))?;
    file.write_all(line)?;
    if sync {
        file.sync_data()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frame_all(texts: &[&str]) -> Vec<u8> {
        texts.iter().flat_map(|t| frame(t)).collect()
    }

    fn read_all(log: &Logger) -> Vec<String> {
        let mut reader = log.reader(0).unwrap();
        let mut lines = Vec::new();
        while let Some(line) = reader.scan_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn append_and_read_back() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log"), dir.path().join("b.log")];

        let mut log = Logger::open_ex(&files, 64, 0).unwrap();
        log.println("1 alpha").unwrap();
        log.println("2 beta").unwrap();

        assert_eq!(read_all(&log), vec!["1 alpha", "2 beta"]);
        assert_eq!(
            std::fs::read(&files[0]).unwrap(),
            std::fs::read(&files[1]).unwrap()
        );
    }

    #[test]
    fn lines_survive_reopen() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log"), dir.path().join("b.log")];
        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("persisted").unwrap();
            log.close().unwrap();
        }

        let log = Logger::open_ex(&files, 64, 0).unwrap();
        assert_eq!(read_all(&log), vec!["persisted"]);
    }

    #[test]
    fn reader_prefers_most_complete_replica() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log"), dir.path().join("b.log")];
        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("one").unwrap();
            log.println("two").unwrap();
        }

        // Tear the tail of the first replica.
        let bytes = std::fs::read(&files[0]).unwrap();
        std::fs::write(&files[0], &bytes[..bytes.len() - 3]).unwrap();

        let log = Logger::open_ex(&files, 64, 0).unwrap();
        assert_eq!(read_all(&log), vec!["one", "two"]);
        assert_eq!(
            std::fs::read(&files[0]).unwrap(),
            std::fs::read(&files[1]).unwrap()
        );
    }

    #[test]
    fn open_cuts_torn_tails_before_appending() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log"), dir.path().join("b.log")];
        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("one").unwrap();
        }
        for file in &files {
            let mut bytes = std::fs::read(file).unwrap();
            bytes.extend_from_slice(b"deadbe");
            std::fs::write(file, bytes).unwrap();
        }

        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("two").unwrap();
        }

        let log = Logger::open_ex(&files, 64, 0).unwrap();
        assert_eq!(read_all(&log), vec!["one", "two"]);
        assert_eq!(std::fs::read(&files[0]).unwrap(), frame_all(&["one", "two"]));
    }

    #[test]
    fn open_catches_up_lagging_replica() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log"), dir.path().join("b.log")];
        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("one").unwrap();
        }
        {
            // Only the first replica is reachable.
            let mut log = Logger::open_ex(&files[..1], 64, 0).unwrap();
            log.println("two").unwrap();
        }

        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("three").unwrap();
        }

        let expected = frame_all(&["one", "two", "three"]);
        assert_eq!(std::fs::read(&files[0]).unwrap(), expected);
        assert_eq!(std::fs::read(&files[1]).unwrap(), expected);
    }

    #[test]
    fn open_merges_diverged_replicas() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log"), dir.path().join("b.log")];
        {
            let mut log = Logger::open_ex(&files, 64, 0).unwrap();
            log.println("1 x").unwrap();
        }
        {
            let mut log = Logger::open_ex(&files[..1], 64, 0).unwrap();
            log.println("2 y").unwrap();
        }
        {
            let mut log = Logger::open_ex(&files[1..], 64, 0).unwrap();
            log.println("3 z").unwrap();
            log.println("4 w").unwrap();
        }

        let log = Logger::open_ex(&files, 64, 0).unwrap();
        assert_eq!(read_all(&log), vec!["1 x", "3 z", "4 w", "2 y"]);
        assert_eq!(
            std::fs::read(&files[0]).unwrap(),
            std::fs::read(&files[1]).unwrap()
        );
    }

    #[test]
    fn reader_starts_at_offset() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log")];

        let mut log = Logger::open_ex(&files, 64, 0).unwrap();
        log.println("one").unwrap();
        log.println("two").unwrap();

        let mut reader = log.reader(0).unwrap();
        reader.scan_line().unwrap();
        let offset = reader.offset();

        let mut rest = log.reader(offset).unwrap();
        assert_eq!(rest.scan_line().unwrap(), Some("two".to_string()));
        assert_eq!(rest.scan_line().unwrap(), None);
    }

    #[test]
    fn missing_replica_within_budget() {
        let dir = tempdir().unwrap();
        let files = [
            dir.path().join("a.log"),
            dir.path().join("missing").join("b.log"),
        ];

        let mut log = Logger::open_ex(&files, 64, 1).unwrap();
        assert_eq!(log.live_replicas(), 1);
        log.println("still works").unwrap();
        assert_eq!(read_all(&log), vec!["still works"]);
    }

    #[test]
    fn missing_replica_over_budget() {
        let dir = tempdir().unwrap();
        let files = [
            dir.path().join("a.log"),
            dir.path().join("missing").join("b.log"),
        ];

        let result = Logger::open_ex(&files, 64, 0);
        assert!(matches!(
            result,
            Err(CoreError::Storage(
                durastore_storage::StorageError::TooManyFails { .. }
            ))
        ));
    }

    #[test]
    fn println_validates_text() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log")];

        let mut log = Logger::open_ex(&files, 4, 0).unwrap();
        assert!(matches!(
            log.println("too long"),
            Err(CoreError::LineTooLong { len: 8, max: 4 })
        ));
        assert!(matches!(
            log.println("a\nb"),
            Err(CoreError::InvalidArgument { .. })
        ));
        assert_eq!(log.size().unwrap(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempdir().unwrap();
        let files = [dir.path().join("a.log")];

        let mut log = Logger::open_ex(&files, 64, 0).unwrap();
        log.close().unwrap();
        log.close().unwrap();
        assert!(matches!(log.println("x"), Err(CoreError::Closed)));
        assert!(matches!(log.reader(0), Err(CoreError::Closed)));
    }
}
