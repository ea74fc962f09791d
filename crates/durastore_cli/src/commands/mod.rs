//! CLI command implementations.

pub mod blob;
pub mod chunks;
pub mod names;
pub mod verify;
