use serde::{Deserialize, Serialize};

use crate::session::SessionPatch;
use crate::transcript::TranscriptChunk;

/// Change notification delivered by the realtime channel for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemoteEvent {
    /// A transcript chunk was inserted by another writer (or confirmed by
    /// the server). Used by transcript-reload paths.
    TranscriptChunkInserted {
        session_id: String,
        chunk: TranscriptChunk,
    },

    /// Session fields changed remotely.
    SessionUpdated {
        session_id: String,
        fields: SessionPatch,
    },
}

impl RemoteEvent {
    pub fn session_id(&self) -> &str {
        match self {
            RemoteEvent::TranscriptChunkInserted { session_id, .. } => session_id,
            RemoteEvent::SessionUpdated { session_id, .. } => session_id,
        }
    }
}
