//! Cat and put command implementations.

use durastore_core::Config;
use durastore_storage::{read_blob, write_blob};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs the cat command.
pub fn cat(replicas: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let payload = read_blob(replicas)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&payload)?;
    stdout.flush()?;
    Ok(())
}

/// Runs the put command.
///
/// Replica files get `config.file_mode` and up to `config.allow_fails`
/// replica writes may fail.
pub fn put(
    input: &Path,
    replicas: &[PathBuf],
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = fs::read(input)?;
    write_blob(replicas, &payload, config.file_mode, config.allow_fails)?;
    info!(
        input = %input.display(),
        replicas = replicas.len(),
        mode = %format_args!("{:o}", config.file_mode),
        bytes = payload.len(),
        "blob stored"
    );
    Ok(())
}
