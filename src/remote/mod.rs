//! Collaborator contracts
//!
//! The core owns no wire format; persistence, note generation, session CRUD
//! and the realtime change feed are services the embedding application
//! provides behind these traits. Only the contract matters here: upserts are
//! idempotent by `(session_id, sequence)`, the realtime channel delivers
//! per-session change events, and the generation service may wrap its note
//! payload in a fenced JSON block.

mod events;
mod services;

pub use events::RemoteEvent;
pub use services::{
    ChunkPersistence, CodeSuggestion, DetailLevel, NoteGenerationService, NoteRequest, RealtimeChannel,
    SessionApi,
};
