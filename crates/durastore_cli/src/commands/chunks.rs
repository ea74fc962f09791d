//! Chunks command implementation.

use durastore_storage::{chunk_name, ChunkedFile};
use serde::Serialize;
use std::path::Path;

/// Layout of a chunked file.
#[derive(Debug, Serialize)]
pub struct ChunkLayout {
    /// Directory holding the chunks.
    pub dir: String,
    /// Chunk size exponent.
    pub chunk_bits: u32,
    /// Bytes per chunk.
    pub chunk_size: u64,
    /// Logical size in bytes.
    pub total_size: u64,
    /// Chunk file names, in order.
    pub chunks: Vec<String>,
}

/// Opens the chunked file and describes it.
pub fn layout(dir: &Path, chunk_bits: u32, size: u64) -> Result<ChunkLayout, Box<dyn std::error::Error>> {
    let mut file = ChunkedFile::open(dir, chunk_bits, size)?;
    let layout = ChunkLayout {
        dir: file.dir().display().to_string(),
        chunk_bits: file.chunk_bits(),
        chunk_size: file.chunk_size(),
        total_size: file.total_size(),
        chunks: (0..file.chunk_count() as u64).map(chunk_name).collect(),
    };
    file.close();
    Ok(layout)
}

/// Runs the chunks command.
pub fn run(
    dir: &Path,
    chunk_bits: u32,
    size: u64,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let layout = layout(dir, chunk_bits, size)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&layout)?),
        _ => {
            println!("Chunked file at {}", layout.dir);
            println!("  Chunk size:  {} bytes (2^{})", layout.chunk_size, layout.chunk_bits);
            println!("  Total size:  {} bytes", layout.total_size);
            println!("  Chunks:      {}", layout.chunks.len());
            for (index, name) in layout.chunks.iter().enumerate() {
                let start = index as u64 * layout.chunk_size;
                let end = (start + layout.chunk_size).min(layout.total_size);
                println!("    {name:>6}  [{start}, {end})");
            }
        }
    }
    Ok(())
}
