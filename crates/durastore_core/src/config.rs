//! Store configuration.

use durastore_storage::DEFAULT_CHUNK_BITS;

/// Configuration shared by the replicated log, registry and chunked tables.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many replicas may fail before an operation fails.
    pub allow_fails: usize,

    /// Maximum length of one log line, framing excluded.
    pub line_max: usize,

    /// Chunk size exponent for chunked tables (0 = default).
    pub chunk_bits: u32,

    /// Unix permission mode for newly written blob replicas.
    pub file_mode: u32,

    /// Whether to sync log replicas after every append.
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_fails: 1,
            line_max: 4096,
            chunk_bits: DEFAULT_CHUNK_BITS, // 64 MB chunks
            file_mode: 0o644,
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the replica failure tolerance.
    #[must_use]
    pub const fn allow_fails(mut self, value: usize) -> Self {
        self.allow_fails = value;
        self
    }

    /// Sets the maximum log line length.
    #[must_use]
    pub const fn line_max(mut self, value: usize) -> Self {
        self.line_max = value;
        self
    }

    /// Sets the chunk size exponent.
    #[must_use]
    pub const fn chunk_bits(mut self, value: u32) -> Self {
        self.chunk_bits = value;
        self
    }

    /// Sets the permission mode for new blob replicas.
    #[must_use]
    pub const fn file_mode(mut self, value: u32) -> Self {
        self.file_mode = value;
        self
    }

    /// Sets whether to sync after every log append.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}
