use serde::{Deserialize, Serialize};

/// Aggregate persistence statistics for one session's chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkStats {
    /// Chunks created so far.
    pub total_chunks: usize,

    /// Chunks durably stored.
    pub saved_chunks: usize,

    /// Chunks still persisting (or waiting on a retry).
    pub pending_chunks: usize,

    /// Chunks that exhausted their retries.
    pub failed_chunks: usize,

    /// Mean add-to-saved latency across saved chunks, in milliseconds.
    pub average_latency_ms: f64,
}
