//! # Durastore Core
//!
//! The replicated pieces built on top of `durastore_storage`:
//!
//! - [`Logger`] - an append-only line log written to every replica
//! - [`NamedServer`] - a persistent name ↔ id registry replayed from that log
//! - [`ChunkedTable`] - a fixed-row table stored in a chunked file, for use
//!   with the `durastore_codec` row operations
//!
//! Only [`NamedServer`] is internally synchronised. Everything else expects
//! its caller to serialise access to a given resource.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod log;
mod named;
mod table;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use log::{LineLog, LineReader, Logger};
pub use named::NamedServer;
pub use table::ChunkedTable;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
