//! Names and register command implementations.

use durastore_core::{Config, NamedServer};
use serde::Serialize;
use std::path::PathBuf;

/// One registry entry.
#[derive(Debug, Serialize)]
pub struct NameEntry {
    /// Assigned id.
    pub id: u32,
    /// Registered name.
    pub name: String,
}

fn open(replicas: &[PathBuf], allow_fails: usize) -> Result<NamedServer, Box<dyn std::error::Error>> {
    let config = Config::new().allow_fails(allow_fails);
    Ok(NamedServer::open_with_config(replicas, &config)?)
}

/// Runs the names command.
pub fn list(
    replicas: &[PathBuf],
    allow_fails: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = open(replicas, allow_fails)?;
    let entries: Vec<NameEntry> = server
        .entries()
        .into_iter()
        .map(|(id, name)| NameEntry { id, name })
        .collect();
    server.close()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&entries)?),
        _ => {
            for entry in &entries {
                println!("{:>10}  {}", entry.id, entry.name);
            }
            println!("{} names", entries.len());
        }
    }
    Ok(())
}

/// Runs the register command.
pub fn register(
    replicas: &[PathBuf],
    allow_fails: usize,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = open(replicas, allow_fails)?;
    let id = server.register(name)?;
    server.close()?;
    println!("{id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn register_is_visible_to_later_opens() {
        let dir = tempdir().unwrap();
        let replicas = vec![dir.path().join("l0"), dir.path().join("l1")];

        register(&replicas, 0, "orders").unwrap();
        register(&replicas, 0, "orders").unwrap();

        let server = open(&replicas, 0).unwrap();
        assert_eq!(server.len(), 1);
        assert!(server.find("orders").is_some());
    }

    #[test]
    fn register_rejects_bad_name() {
        let dir = tempdir().unwrap();
        let replicas = vec![dir.path().join("l0")];
        assert!(register(&replicas, 0, "two words").is_err());
    }
}
