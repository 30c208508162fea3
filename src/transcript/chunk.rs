use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diarize::Speaker;

/// Persistence state of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Persist in flight (or queued for retry).
    Pending,
    /// Durably stored.
    Saved,
    /// All retry attempts exhausted.
    Failed,
}

/// One speaker-labeled, sequence-numbered transcript fragment.
///
/// Immutable once created: only `sync_state` changes as persistence
/// progresses. The `(session, sequence)` pair is the durable identity the
/// persistence API upserts under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Position in the transcript, 0-based and gapless per session.
    pub sequence: u64,

    /// Who said it.
    pub speaker: Speaker,

    /// Final transcribed text.
    pub text: String,

    /// When the fragment was captured.
    pub created_at: DateTime<Utc>,

    /// Persistence progress. Local bookkeeping, not part of the durable
    /// record.
    pub sync_state: SyncState,
}
