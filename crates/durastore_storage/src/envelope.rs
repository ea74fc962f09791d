//! CRC32 integrity envelope for replicated blobs.
//!
//! Every replica file holds the same envelope:
//!
//! ```text
//! | crc32 as 8 hex chars | "\r\n" | payload ... |
//! ```
//!
//! A replica whose header is malformed or whose checksum does not match
//! its payload is treated exactly like a missing one: it is skipped and the
//! next replica is tried.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Size of the envelope header in bytes.
pub const HEADER_LEN: usize = 10;

const CRC_HEX_LEN: usize = 8;

/// Wraps `data` in an envelope.
///
/// # Example
///
/// ```rust
/// use durastore_storage::{decode_envelope, encode_envelope};
///
/// let envelope = encode_envelope(b"hello");
/// assert_eq!(&envelope[..10], b"3610a686\r\n");
/// assert_eq!(decode_envelope(&envelope).unwrap(), b"hello");
/// ```
#[must_use]
pub fn encode_envelope(data: &[u8]) -> Vec<u8> {
    let crc = crc32fast::hash(data);
    let mut envelope = Vec::with_capacity(HEADER_LEN + data.len());
    envelope.extend_from_slice(format!("{crc:08x}").as_bytes());
    envelope.extend_from_slice(b"\r\n");
    envelope.extend_from_slice(data);
    envelope
}

/// Validates an envelope and returns its payload.
///
/// # Errors
///
/// Returns `BadData` if the header is short or malformed, and
/// `ChecksumMismatch` if the payload does not match the stored CRC.
pub fn decode_envelope(bytes: &[u8]) -> StorageResult<&[u8]> {
    if bytes.len() < HEADER_LEN {
        return Err(StorageError::bad_data(format!(
            "envelope too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[CRC_HEX_LEN..HEADER_LEN] != b"\r\n" {
        return Err(StorageError::bad_data("missing header terminator"));
    }

    let hex = &bytes[..CRC_HEX_LEN];
    if !hex.iter().all(u8::is_ascii_hexdigit) {
        return Err(StorageError::bad_data("header is not a hex checksum"));
    }
    // All bytes are ASCII hex digits, so this is valid UTF-8 and a valid u32.
    let expected = std::str::from_utf8(hex)
        .ok()
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| StorageError::bad_data("header is not a hex checksum"))?;

    let payload = &bytes[HEADER_LEN..];
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(StorageError::ChecksumMismatch { expected, actual });
    }
    Ok(payload)
}

/// Writes `data` to every replica path.
///
/// The envelope is built once and written identically to each path. Each
/// path is replaced as a whole: the envelope goes to a temporary sibling
/// file which is synced and then renamed over the target. `perm` is the
/// Unix permission mode used when the file is created.
///
/// This is a best-effort majority write. A failing path is logged and
/// counted, and the call only fails once the count exceeds `allow_fails`.
///
/// # Errors
///
/// Returns `TooManyFails` if more than `allow_fails` paths could not be
/// written.
pub fn write_blob<P: AsRef<Path>>(
    paths: &[P],
    data: &[u8],
    perm: u32,
    allow_fails: usize,
) -> StorageResult<()> {
    let envelope = encode_envelope(data);
    let mut fails = 0;

    for path in paths {
        let path = path.as_ref();
        if let Err(e) = write_replica(path, &envelope, perm) {
            warn!(path = %path.display(), error = %e, "replica write failed");
            fails += 1;
        }
    }

    if fails > allow_fails {
        return Err(StorageError::TooManyFails {
            fails,
            allowed: allow_fails,
        });
    }

    debug!(
        replicas = paths.len(),
        fails,
        bytes = data.len(),
        "blob written"
    );
    Ok(())
}

/// Reads a blob from the first replica whose envelope validates.
///
/// Replicas are tried in order. Missing, unreadable and corrupt replicas
/// are all skipped the same way.
///
/// # Errors
///
/// Returns `TooManyFails` when no replica validates.
pub fn read_blob<P: AsRef<Path>>(paths: &[P]) -> StorageResult<Vec<u8>> {
    for path in paths {
        let path = path.as_ref();
        match read_replica(path) {
            Ok(payload) => return Ok(payload),
            Err(e) => warn!(
                path = %path.display(),
                corrupt = e.is_corruption(),
                error = %e,
                "skipping replica"
            ),
        }
    }

    Err(StorageError::TooManyFails {
        fails: paths.len(),
        allowed: paths.len().saturating_sub(1),
    })
}

/// Reads and validates a single replica.
///
/// # Errors
///
/// Returns the I/O or validation error for this replica.
pub fn read_replica(path: &Path) -> StorageResult<Vec<u8>> {
    let mut bytes = fs::read(path)?;
    decode_envelope(&bytes)?;
    bytes.drain(..HEADER_LEN);
    Ok(bytes)
}

fn write_replica(path: &Path, envelope: &[u8], perm: u32) -> StorageResult<()> {
    let temp_path = temp_path_for(path);

    let result = write_and_sync(&temp_path, envelope, perm)
        .and_then(|()| fs::rename(&temp_path, path).map_err(StorageError::from))
        .and_then(|()| sync_parent(path));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_sync(path: &Path, data: &[u8], perm: u32) -> StorageResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(perm);
    }
    #[cfg(not(unix))]
    let _ = perm;

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> StorageResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> StorageResult<()> {
    Ok(())
}
