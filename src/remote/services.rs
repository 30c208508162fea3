use anyhow::Result;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::events::RemoteEvent;
use crate::session::{Session, SessionPatch};
use crate::transcript::TranscriptChunk;

/// Durable storage for transcript chunks.
///
/// The upsert is keyed by `(session_id, chunk.sequence)` and must be
/// idempotent: the store retries on transient failure and may deliver the
/// same chunk more than once.
#[async_trait::async_trait]
pub trait ChunkPersistence: Send + Sync {
    async fn upsert_chunk(&self, session_id: &str, chunk: &TranscriptChunk) -> Result<()>;
}

/// How much detail the generated note should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Brief,
    Standard,
    Detailed,
}

impl Default for DetailLevel {
    fn default() -> Self {
        DetailLevel::Standard
    }
}

/// Request sent to the note-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRequest {
    pub session_id: String,
    pub transcript: String,
    /// Free-form clinical context supplied by the provider.
    pub context: Option<String>,
    pub detail_level: DetailLevel,
    pub template_id: Option<String>,
}

/// A billing-code suggestion from the optional coding stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSuggestion {
    pub code: String,
    pub description: String,
}

/// External generation service consumed by the pipeline.
///
/// `generate_note` returns the raw payload string; it may be plain text,
/// bare JSON, or JSON wrapped in a fenced code block. Parsing is the
/// orchestrator's job, not the service's.
#[async_trait::async_trait]
pub trait NoteGenerationService: Send + Sync {
    async fn generate_note(&self, request: &NoteRequest) -> Result<String>;

    async fn extract_tasks(&self, transcript: &str) -> Result<Vec<String>>;

    async fn suggest_codes(&self, transcript: &str) -> Result<Vec<CodeSuggestion>>;
}

/// Session CRUD, narrowed to what the core needs.
#[async_trait::async_trait]
pub trait SessionApi: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Session>;

    async fn update(&self, session_id: &str, fields: SessionPatch) -> Result<()>;
}

/// Per-session realtime change feed.
#[async_trait::async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Subscribe to change events for one session. The stream ends when the
    /// subscription is torn down by the provider.
    async fn subscribe(&self, session_id: &str) -> Result<BoxStream<'static, RemoteEvent>>;
}
