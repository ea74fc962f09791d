//! Durastore CLI
//!
//! Command-line tools for inspecting and maintaining durastore files.
//!
//! # Commands
//!
//! - `verify` - Check the envelope of every replica of a blob
//! - `cat` - Print a blob read from its replicas
//! - `put` - Write a blob to its replicas
//! - `names` - List the entries of a name registry
//! - `register` - Register a name and print its id
//! - `chunks` - Show the layout of a chunked file

mod commands;

use clap::{Parser, Subcommand};
use durastore_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Durastore command-line storage tools.
#[derive(Parser)]
#[command(name = "durastore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the integrity envelope of each replica
    Verify {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Replica paths
        #[arg(required = true)]
        replicas: Vec<PathBuf>,
    },

    /// Print a blob to stdout
    Cat {
        /// Replica paths, tried in order
        #[arg(required = true)]
        replicas: Vec<PathBuf>,
    },

    /// Write a blob to every replica
    Put {
        /// File holding the payload
        #[arg(short, long)]
        input: PathBuf,

        /// Number of replica writes allowed to fail
        #[arg(short, long, default_value = "1")]
        allow_fails: usize,

        /// Permission bits for the replica files, in octal [default: 644]
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<u32>,

        /// Replica paths
        #[arg(required = true)]
        replicas: Vec<PathBuf>,
    },

    /// List the entries of a name registry
    Names {
        /// Number of log replicas allowed to fail
        #[arg(short, long, default_value = "1")]
        allow_fails: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Log replica paths
        #[arg(required = true)]
        replicas: Vec<PathBuf>,
    },

    /// Register a name and print its id
    Register {
        /// Name to register
        name: String,

        /// Number of log replicas allowed to fail
        #[arg(short, long, default_value = "1")]
        allow_fails: usize,

        /// Log replica paths
        #[arg(required = true)]
        replicas: Vec<PathBuf>,
    },

    /// Open a chunked file and show its layout
    Chunks {
        /// Directory holding the chunk files
        #[arg(short, long)]
        dir: PathBuf,

        /// Chunk size as a power of two (0 selects the default)
        #[arg(short, long, default_value = "0")]
        chunk_bits: u32,

        /// Logical size in bytes
        #[arg(short, long)]
        size: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn parse_mode(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Verify { format, replicas } => {
            commands::verify::run(&replicas, &format)?;
        }
        Commands::Cat { replicas } => {
            commands::blob::cat(&replicas)?;
        }
        Commands::Put {
            input,
            allow_fails,
            mode,
            replicas,
        } => {
            let mut config = Config::new().allow_fails(allow_fails);
            if let Some(mode) = mode {
                config = config.file_mode(mode);
            }
            commands::blob::put(&input, &replicas, &config)?;
        }
        Commands::Names {
            allow_fails,
            format,
            replicas,
        } => {
            commands::names::list(&replicas, allow_fails, &format)?;
        }
        Commands::Register {
            name,
            allow_fails,
            replicas,
        } => {
            commands::names::register(&replicas, allow_fails, &name)?;
        }
        Commands::Chunks {
            dir,
            chunk_bits,
            size,
            format,
        } => {
            commands::chunks::run(&dir, chunk_bits, size, &format)?;
        }
        Commands::Version => {
            println!("Durastore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Durastore Core v{}", durastore_core::VERSION);
        }
    }

    Ok(())
}
