//! Replica sets: one logical resource backed by several independent files.

use crate::error::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An ordered set of replica files for one logical resource.
///
/// Each slot holds either a live file handle or a tombstone for a replica
/// that could not be opened. A set is created once from a list of paths and
/// never resized afterwards.
///
/// # Thread Safety
///
/// There is no internal locking. Callers serialise access to a given
/// logical resource themselves.
///
/// # Example
///
/// ```no_run
/// use durastore_storage::ReplicaSet;
///
/// let replicas = ReplicaSet::open(&["a/names.log", "b/names.log", "c/names.log"], 1).unwrap();
/// let size = replicas.fsize(1).unwrap();
/// println!("{} live replicas, {} bytes", replicas.live_count(), size);
/// ```
#[derive(Debug)]
pub struct ReplicaSet {
    paths: Vec<PathBuf>,
    files: Vec<Option<File>>,
}

impl ReplicaSet {
    /// Opens every path for read/write, creating missing files.
    ///
    /// A path that cannot be opened leaves a tombstone in its slot. Once the
    /// number of such failures exceeds `allow_fails` the handles opened so far
    /// are closed and the whole open fails.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty path list and `TooManyFails`
    /// when more than `allow_fails` replicas cannot be opened.
    pub fn open<P: AsRef<Path>>(paths: &[P], allow_fails: usize) -> StorageResult<Self> {
        if paths.is_empty() {
            return Err(StorageError::invalid_argument("replica set needs at least one path"));
        }

        let mut files = Vec::with_capacity(paths.len());
        let mut fails = 0;

        for path in paths {
            let path = path.as_ref();
            match open_replica(path) {
                Ok(file) => files.push(Some(file)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot open replica");
                    fails += 1;
                    if fails > allow_fails {
                        // `files` is dropped here, closing every opened handle.
                        return Err(StorageError::TooManyFails {
                            fails,
                            allowed: allow_fails,
                        });
                    }
                    files.push(None);
                }
            }
        }

        debug!(replicas = paths.len(), fails, "replica set opened");

        Ok(Self {
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            files,
        })
    }

    /// Returns the logical size: the largest size among live replicas.
    ///
    /// Tombstones and replicas whose metadata cannot be read count as
    /// failures. A replica that is larger than the others may be the most
    /// complete one, so the maximum is reported rather than a minimum.
    ///
    /// # Errors
    ///
    /// Returns `TooManyFails` once failures exceed `allow_fails`.
    pub fn fsize(&self, allow_fails: usize) -> StorageResult<u64> {
        let mut fails = 0;
        let mut size = 0u64;

        for (path, file) in self.paths.iter().zip(&self.files) {
            let Some(file) = file else {
                fails += 1;
                continue;
            };
            match file.metadata() {
                Ok(meta) => size = size.max(meta.len()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot stat replica");
                    fails += 1;
                }
            }
        }

        if fails > allow_fails {
            return Err(StorageError::TooManyFails {
                fails,
                allowed: allow_fails,
            });
        }
        Ok(size)
    }

    /// Returns the number of slots, live or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the set has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the number of live handles.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_some()).count()
    }

    /// Returns the replica paths in slot order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Iterates over live replicas.
    pub fn live(&self) -> impl Iterator<Item = (&Path, &File)> {
        self.paths
            .iter()
            .zip(&self.files)
            .filter_map(|(path, file)| file.as_ref().map(|f| (path.as_path(), f)))
    }

    /// Iterates mutably over live replicas.
    pub fn live_mut(&mut self) -> impl Iterator<Item = (&Path, &mut File)> {
        self.paths
            .iter()
            .zip(self.files.iter_mut())
            .filter_map(|(path, file)| file.as_mut().map(|f| (path.as_path(), f)))
    }

    /// Returns the live handle in slot `index`, if any.
    pub fn file_mut(&mut self, index: usize) -> Option<&mut File> {
        self.files.get_mut(index).and_then(Option::as_mut)
    }

    /// Tombstones slot `index` after a failure on that replica.
    ///
    /// The replica takes no further reads or writes through this set, so
    /// the live replicas stay identical to each other.
    pub fn retire(&mut self, index: usize) {
        if let Some(slot) = self.files.get_mut(index) {
            if slot.take().is_some() {
                warn!(path = %self.paths[index].display(), "replica retired");
            }
        }
    }

    /// Closes every live handle. Calling this again is a no-op.
    pub fn close(&mut self) {
        for file in &mut self.files {
            file.take();
        }
    }
}

fn open_replica(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn open_creates_missing_files() {
        let dir = tempdir().unwrap();
        let paths = [dir.path().join("a"), dir.path().join("b")];

        let set = ReplicaSet::open(&paths, 0).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.live_count(), 2);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn open_tolerates_failures_within_budget() {
        let dir = tempdir().unwrap();
        let paths = [
            dir.path().join("a"),
            dir.path().join("missing").join("b"),
            dir.path().join("c"),
        ];

        let set = ReplicaSet::open(&paths, 1).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.live_count(), 2);
        let live: Vec<_> = set.live().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(live, vec![paths[0].clone(), paths[2].clone()]);
    }

    #[test]
    fn open_fails_when_budget_exceeded() {
        let dir = tempdir().unwrap();
        let paths = [
            dir.path().join("missing1").join("a"),
            dir.path().join("b"),
            dir.path().join("missing2").join("c"),
        ];

        let result = ReplicaSet::open(&paths, 1);
        assert!(matches!(
            result,
            Err(StorageError::TooManyFails {
                fails: 2,
                allowed: 1
            })
        ));
    }

    #[test]
    fn open_rejects_empty_path_list() {
        let paths: [PathBuf; 0] = [];
        assert!(matches!(
            ReplicaSet::open(&paths, 0),
            Err(StorageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn fsize_reports_largest_replica() {
        let dir = tempdir().unwrap();
        let paths = [dir.path().join("a"), dir.path().join("b")];
        std::fs::write(&paths[0], b"short").unwrap();
        std::fs::write(&paths[1], b"a bit longer").unwrap();

        let set = ReplicaSet::open(&paths, 0).unwrap();
        assert_eq!(set.fsize(0).unwrap(), 12);
    }

    #[test]
    fn fsize_counts_tombstones_as_failures() {
        let dir = tempdir().unwrap();
        let paths = [dir.path().join("a"), dir.path().join("missing").join("b")];

        let set = ReplicaSet::open(&paths, 1).unwrap();
        assert_eq!(set.fsize(1).unwrap(), 0);
        assert!(matches!(
            set.fsize(0),
            Err(StorageError::TooManyFails { .. })
        ));
    }

    #[test]
    fn live_mut_writes_reach_every_replica() {
        let dir = tempdir().unwrap();
        let paths = [dir.path().join("a"), dir.path().join("b")];

        let mut set = ReplicaSet::open(&paths, 0).unwrap();
        for (_, file) in set.live_mut() {
            file.write_all(b"xyz").unwrap();
        }
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"xyz");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"xyz");
    }

    #[test]
    fn retire_tombstones_one_slot() {
        let dir = tempdir().unwrap();
        let paths = [dir.path().join("a"), dir.path().join("b")];

        let mut set = ReplicaSet::open(&paths, 0).unwrap();
        set.retire(0);
        set.retire(0);
        set.retire(7);
        assert_eq!(set.live_count(), 1);
        assert!(set.file_mut(0).is_none());
        assert!(set.file_mut(1).is_some());
        assert!(matches!(
            set.fsize(0),
            Err(StorageError::TooManyFails { fails: 1, .. })
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempdir().unwrap();
        let paths = [dir.path().join("a")];

        let mut set = ReplicaSet::open(&paths, 0).unwrap();
        set.close();
        set.close();
        assert_eq!(set.live_count(), 0);
        assert_eq!(set.len(), 1);
    }
}
