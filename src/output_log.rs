// src/output_log.rs

//! In-memory record of everything the agent printed.

/// Tag placed in front of every stderr chunk in the saved log.
pub const STDERR_PREFIX: &str = "[STDERR] ";

/// Append-only buffer of agent output, in arrival order.
///
/// Stdout chunks are stored verbatim; stderr chunks are stored with
/// [`STDERR_PREFIX`]. No attempt is made to split or reorder interleaved
/// chunks from the two streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLog {
    text: String,
    chunks: usize,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_stdout(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.chunks += 1;
    }

    pub fn append_stderr(&mut self, chunk: &str) {
        self.text.push_str(STDERR_PREFIX);
        self.text.push_str(chunk);
        self.chunks += 1;
    }

    /// Full log text as it will be written to disk.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

