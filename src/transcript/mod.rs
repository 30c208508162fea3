//! Transcript chunk buffering and persistence
//!
//! This module owns every labeled fragment captured during a session:
//! - sequence numbers are assigned here, strictly increasing and gapless;
//! - chunks land in an append-only in-memory arena first, so readers see
//!   them before any network round-trip completes;
//! - each chunk is persisted asynchronously with retry, and transcripts are
//!   always rebuilt from sequence order, never from completion order.

mod chunk;
mod stats;
mod store;

pub use chunk::{SyncState, TranscriptChunk};
pub use stats::ChunkStats;
pub use store::TranscriptChunkStore;
