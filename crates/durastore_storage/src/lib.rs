//! # Durastore Storage
//!
//! The lowest layer of Durastore: redundant local copies and large-file
//! virtualization on top of plain file handles.
//!
//! ## Building Blocks
//!
//! - [`ReplicaSet`] - N backing files for one logical resource, tolerating
//!   a bounded number of open/stat failures
//! - [`write_blob`] / [`read_blob`] - whole blobs stored in every replica
//!   behind a CRC32 envelope; the first replica that validates wins
//! - [`ChunkedFile`] - one large addressable file stored as fixed-size
//!   chunk files
//!
//! ## Failure Model
//!
//! Corruption and unavailability of a single replica are handled the same
//! way: skip it and try the next one. Only when the configured tolerance is
//! exceeded does a caller see [`StorageError::TooManyFails`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use durastore_storage::{read_blob, write_blob};
//!
//! let paths = ["/disk1/config.bin", "/disk2/config.bin", "/disk3/config.bin"];
//! write_blob(&paths, b"settings", 0o644, 1).unwrap();
//! assert_eq!(read_blob(&paths).unwrap(), b"settings");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunked;
mod envelope;
mod error;
mod pio;
mod replica;

pub use chunked::{chunk_name, ChunkedFile, DEFAULT_CHUNK_BITS, MAX_CHUNK_BITS};
pub use envelope::{
    decode_envelope, encode_envelope, read_blob, read_replica, write_blob, HEADER_LEN,
};
pub use error::{StorageError, StorageResult};
pub use replica::ReplicaSet;
