//! Verify command implementation.

use durastore_storage::{read_replica, StorageError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Verification outcome for one replica.
#[derive(Debug, Serialize)]
pub struct ReplicaStatus {
    /// Replica path.
    pub path: String,
    /// Whether the envelope validated.
    pub valid: bool,
    /// Payload length, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<usize>,
    /// Whether the replica was readable but held damaged content.
    pub corrupt: bool,
    /// Why the replica was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Verification result.
#[derive(Debug, Serialize)]
pub struct VerifyResult {
    /// Per-replica outcomes, in argument order.
    pub replicas: Vec<ReplicaStatus>,
    /// Number of valid replicas.
    pub valid_replicas: usize,
    /// Whether every valid replica holds the same payload.
    pub consistent: bool,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.valid_replicas > 0
    }
}

/// Runs the verify command.
pub fn run(replicas: &[PathBuf], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = verify(replicas);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    if result.is_ok() {
        Ok(())
    } else {
        Err("Verification failed: no valid replica".into())
    }
}

/// Checks every replica.
pub fn verify<P: AsRef<Path>>(replicas: &[P]) -> VerifyResult {
    let mut statuses = Vec::with_capacity(replicas.len());
    let mut first: Option<Vec<u8>> = None;
    let mut consistent = true;

    for path in replicas {
        let path = path.as_ref();
        let status = match read_replica(path) {
            Ok(payload) => {
                let len = payload.len();
                match &first {
                    Some(seen) if *seen != payload => consistent = false,
                    Some(_) => {}
                    None => first = Some(payload),
                }
                ReplicaStatus {
                    path: path.display().to_string(),
                    valid: true,
                    payload_len: Some(len),
                    corrupt: false,
                    error: None,
                }
            }
            Err(e) => ReplicaStatus {
                path: path.display().to_string(),
                valid: false,
                payload_len: None,
                corrupt: e.is_corruption(),
                error: Some(describe(&e)),
            },
        };
        statuses.push(status);
    }

    let valid_replicas = statuses.iter().filter(|s| s.valid).count();
    VerifyResult {
        replicas: statuses,
        valid_replicas,
        consistent,
    }
}

fn describe(error: &StorageError) -> String {
    match error {
        StorageError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => "missing".to_string(),
        other => other.to_string(),
    }
}

fn print_text_output(result: &VerifyResult) {
    for status in &result.replicas {
        match (&status.payload_len, &status.error) {
            (Some(len), _) => println!("  ✓ {} ({} bytes)", status.path, len),
            (None, Some(error)) if status.corrupt => {
                println!("  ✗ {}: corrupt: {}", status.path, error);
            }
            (None, Some(error)) => println!("  ✗ {}: {}", status.path, error),
            (None, None) => println!("  ✗ {}", status.path),
        }
    }
    println!();
    println!(
        "{} of {} replicas valid",
        result.valid_replicas,
        result.replicas.len()
    );
    if !result.consistent {
        println!("WARNING: valid replicas hold different payloads");
    }
}
