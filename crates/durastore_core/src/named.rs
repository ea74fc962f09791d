//! Name registry: a persistent, bidirectional name ↔ id map.
//!
//! Entries are appended to a [`LineLog`] as `<id> <name>` lines and
//! replayed on open. An entry is admitted into the in-memory maps only
//! after its line has been appended, so a crash between the two steps is
//! harmless: replay rebuilds exactly what was persisted.
//!
//! Replay keeps the first entry for each name and each id. A later line
//! that reuses either one is skipped with a warning, so the two maps stay
//! inverse to each other.
//!
//! ## Id Allocation
//!
//! Ids are `u32` and strictly increasing for the lifetime of a registry.
//! On open, the allocation base is raised to the current Unix time, so ids
//! are never reused across restarts, even if the log lost entries.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::log::{LineLog, Logger};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// A thread-safe name registry.
///
/// # Locking
///
/// One reader-writer lock guards both maps, the allocation base and the
/// log. [`NamedServer::register`] holds the write lock for its whole
/// duration, including the log append. Lookups take the read lock and
/// never touch the log.
///
/// # Example
///
/// ```no_run
/// use durastore_core::NamedServer;
///
/// let registry = NamedServer::open(&["a/names.log", "b/names.log"], 4096, 1).unwrap();
/// let id = registry.register("orders").unwrap();
/// assert_eq!(registry.find("orders"), Some(id));
/// assert_eq!(registry.find_rev(id).as_deref(), Some("orders"));
/// ```
pub struct NamedServer {
    state: RwLock<State>,
}

struct State {
    forward: HashMap<String, u32>,
    reverse: HashMap<u32, String>,
    base: u32,
    log: Option<Box<dyn LineLog>>,
}

impl NamedServer {
    /// Opens a registry backed by a replicated log over `files`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or replayed.
    pub fn open<P: AsRef<Path>>(
        files: &[P],
        line_max: usize,
        allow_fails: usize,
    ) -> CoreResult<Self> {
        Self::with_log(Box::new(Logger::open_ex(files, line_max, allow_fails)?))
    }

    /// Opens a registry with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or replayed.
    pub fn open_with_config<P: AsRef<Path>>(files: &[P], config: &Config) -> CoreResult<Self> {
        Self::with_log(Box::new(Logger::open_with_config(files, config)?))
    }

    /// Builds a registry by replaying `log` from the start.
    ///
    /// # Errors
    ///
    /// Returns `LogParse` if a line is not a valid entry, or the log's own
    /// read error.
    pub fn with_log(log: Box<dyn LineLog>) -> CoreResult<Self> {
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();
        let mut base = 0u32;

        let mut reader = log.reader(0)?;
        let mut skipped = 0usize;
        while let Some((id, name)) = reader.scan_entry()? {
            base = base.max(id);
            if forward.contains_key(&name) || reverse.contains_key(&id) {
                warn!(id, name = %name, "conflicting registry entry skipped");
                skipped += 1;
                continue;
            }
            forward.insert(name.clone(), id);
            reverse.insert(id, name);
        }

        let replayed = forward.len();
        let max_id = base;
        base = base.max(unix_now());
        info!(entries = replayed, skipped, max_id, base, "registry loaded");

        Ok(Self {
            state: RwLock::new(State {
                forward,
                reverse,
                base,
                log: Some(log),
            }),
        })
    }

    /// Returns the id of `name`, registering it if it is new.
    ///
    /// A new id is the first id above the allocation base that is not in
    /// use. Ids are never deleted, so normally that is `base + 1`; the scan
    /// only matters when replay left ids above the base.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for empty names or names containing whitespace,
    /// `Closed` after [`NamedServer::close`], or the log's append error. On
    /// error the registry is unchanged.
    pub fn register(&self, name: &str) -> CoreResult<u32> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(CoreError::invalid_name(name));
        }

        let mut state = self.state.write();
        if let Some(&id) = state.forward.get(name) {
            return Ok(id);
        }

        let mut id = state.base.checked_add(1).ok_or(CoreError::IdSpaceExhausted)?;
        while state.reverse.contains_key(&id) {
            id = id.checked_add(1).ok_or(CoreError::IdSpaceExhausted)?;
        }

        state
            .log
            .as_mut()
            .ok_or(CoreError::Closed)?
            .println(&format!("{id} {name}"))?;

        state.forward.insert(name.to_string(), id);
        state.reverse.insert(id, name.to_string());
        state.base = id;
        debug!(id, name, "registered");
        Ok(id)
    }

    /// Looks up the id of `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<u32> {
        self.state.read().forward.get(name).copied()
    }

    /// Looks up the name registered under `id`.
    #[must_use]
    pub fn find_rev(&self, id: u32) -> Option<String> {
        self.state.read().reverse.get(&id).cloned()
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().forward.len()
    }

    /// Returns true if no names are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all entries ordered by id.
    #[must_use]
    pub fn entries(&self) -> Vec<(u32, String)> {
        let state = self.state.read();
        let mut entries: Vec<_> = state
            .reverse
            .iter()
            .map(|(&id, name)| (id, name.clone()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    /// Closes the underlying log. Later calls are no-ops.
    ///
    /// Lookups keep working after close; registration fails with `Closed`.
    ///
    /// # Errors
    ///
    /// Returns the log's close error.
    pub fn close(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        if let Some(mut log) = state.log.take() {
            log.close()?;
            info!(entries = state.forward.len(), "registry closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for NamedServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("NamedServer")
            .field("entries", &state.forward.len())
            .field("base", &state.base)
            .field("open", &state.log.is_some())
            .finish()
    }
}

fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LineReader;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// In-memory log whose appends can be made to fail.
    #[derive(Default, Clone)]
    struct MemoryLog {
        lines: Arc<Mutex<Vec<String>>>,
        fail_appends: Arc<Mutex<bool>>,
    }

    impl LineLog for MemoryLog {
        fn reader(&self, _offset: u64) -> CoreResult<LineReader> {
            Ok(LineReader::from_lines(self.lines.lock().clone(), 0))
        }

        fn println(&mut self, text: &str) -> CoreResult<()> {
            if *self.fail_appends.lock() {
                return Err(CoreError::TooManyFails {
                    fails: 1,
                    allowed: 0,
                });
            }
            self.lines.lock().push(text.to_string());
            Ok(())
        }

        fn close(&mut self) -> CoreResult<()> {
            Ok(())
        }
    }

    fn log_with(lines: &[&str]) -> MemoryLog {
        let log = MemoryLog::default();
        log.lines
            .lock()
            .extend(lines.iter().map(|l| (*l).to_string()));
        log
    }

    #[test]
    fn replay_rebuilds_maps() {
        let server = NamedServer::with_log(Box::new(log_with(&["5 alpha", "9 beta"]))).unwrap();

        assert_eq!(server.find("alpha"), Some(5));
        assert_eq!(server.find("beta"), Some(9));
        assert_eq!(server.find_rev(9).as_deref(), Some("beta"));
        assert_eq!(server.find("gamma"), None);
        assert_eq!(server.find_rev(6), None);
        assert_eq!(server.len(), 2);
    }

    #[test]
    fn replay_rejects_malformed_line() {
        let result = NamedServer::with_log(Box::new(log_with(&["5 alpha", "garbage"])));
        assert!(matches!(result, Err(CoreError::LogParse { .. })));
    }

    #[test]
    fn replay_skips_reused_names_and_ids() {
        let server = NamedServer::with_log(Box::new(log_with(&[
            "5 a", "6 a", "7 b", "7 c", "8 d",
        ])))
        .unwrap();

        assert_eq!(server.find("a"), Some(5));
        assert_eq!(server.find_rev(6), None);
        assert_eq!(server.find("b"), Some(7));
        assert_eq!(server.find("c"), None);
        assert_eq!(server.len(), 3);
        assert_eq!(
            server.entries(),
            vec![(5, "a".to_string()), (7, "b".to_string()), (8, "d".to_string())]
        );
    }

    #[test]
    fn base_is_seeded_from_clock() {
        let before = unix_now();
        let server = NamedServer::with_log(Box::new(log_with(&["5 alpha"]))).unwrap();
        let id = server.register("beta").unwrap();
        assert!(id > before);
    }

    #[test]
    fn base_is_seeded_from_log_when_ahead_of_clock() {
        let server =
            NamedServer::with_log(Box::new(log_with(&["4000000000 alpha"]))).unwrap();
        assert_eq!(server.register("beta").unwrap(), 4_000_000_001);
    }

    #[test]
    fn register_skips_ids_in_use() {
        let log = log_with(&["4000000001 alpha", "4000000002 gamma"]);
        let server = NamedServer::with_log(Box::new(log.clone())).unwrap();
        // A base lagging behind ids in use, as left by a damaged log.
        server.state.write().base = 4_000_000_000;

        let id = server.register("beta").unwrap();
        assert_eq!(id, 4_000_000_003);
        assert_eq!(
            log.lines.lock().last().map(String::as_str),
            Some("4000000003 beta")
        );
    }

    #[test]
    fn register_is_idempotent() {
        let log = MemoryLog::default();
        let server = NamedServer::with_log(Box::new(log.clone())).unwrap();

        let first = server.register("x").unwrap();
        let second = server.register("x").unwrap();
        assert_eq!(first, second);
        assert_eq!(log.lines.lock().len(), 1);
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let server = NamedServer::with_log(Box::new(MemoryLog::default())).unwrap();

        let ids: Vec<u32> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| server.register(n).unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn failed_append_leaves_maps_untouched() {
        let log = MemoryLog::default();
        let server = NamedServer::with_log(Box::new(log.clone())).unwrap();
        let kept = server.register("kept").unwrap();

        *log.fail_appends.lock() = true;
        assert!(server.register("lost").is_err());
        assert_eq!(server.find("lost"), None);
        assert_eq!(server.find_rev(kept + 1), None);
        assert_eq!(server.len(), 1);

        *log.fail_appends.lock() = false;
        assert_eq!(server.register("lost").unwrap(), kept + 1);
    }

    #[test]
    fn register_rejects_bad_names() {
        let server = NamedServer::with_log(Box::new(MemoryLog::default())).unwrap();
        for bad in ["", "two words", "tab\tname", "new\nline"] {
            assert!(matches!(
                server.register(bad),
                Err(CoreError::InvalidName { .. })
            ));
        }
        assert!(server.is_empty());
    }

    #[test]
    fn close_is_idempotent_and_blocks_register() {
        let server = NamedServer::with_log(Box::new(MemoryLog::default())).unwrap();
        let id = server.register("x").unwrap();

        server.close().unwrap();
        server.close().unwrap();
        assert!(matches!(server.register("y"), Err(CoreError::Closed)));
        assert_eq!(server.register("x").unwrap(), id);
        assert_eq!(server.find("x"), Some(id));
    }

    #[test]
    fn entries_are_sorted_by_id() {
        let server =
            NamedServer::with_log(Box::new(log_with(&["9 beta", "5 alpha"]))).unwrap();
        assert_eq!(
            server.entries(),
            vec![(5, "alpha".to_string()), (9, "beta".to_string())]
        );
    }

    #[test]
    fn concurrent_registration_assigns_unique_ids() {
        let server = Arc::new(NamedServer::with_log(Box::new(MemoryLog::default())).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let server = Arc::clone(&server);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| server.register(&format!("n{t}_{i}")).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(server.len(), 200);
    }
}
