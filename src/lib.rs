//! scribe-core: clinical conversation capture and note generation
//!
//! Captures a live or played-back clinical conversation, turns it into a
//! speaker-labeled transcript, and drives the staged pipeline that produces
//! a structured clinical note. The embedding application supplies the
//! speech backend, chunk persistence, note-generation service, session CRUD
//! and realtime feed behind the traits in [`remote`] and [`capture`].

pub mod capture;
pub mod config;
pub mod diarize;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod session;
pub mod sync;
pub mod transcript;

pub use capture::{
    AudioBackend, AudioCaptureController, CaptureEvent, CaptureOptions, CaptureState,
    MicrophoneSlot, TranscriptEvent,
};
pub use config::CoreConfig;
pub use diarize::{DiarizationMode, LabeledFragment, Speaker, SpeakerDiarizer};
pub use error::{CaptureError, PipelineError};
pub use pipeline::{
    NoteGenerationOrchestrator, PipelineOptions, PipelineResult, StageDescriptor, StageStatus,
    StateObserver, WorkflowState,
};
pub use remote::{
    ChunkPersistence, CodeSuggestion, DetailLevel, NoteGenerationService, NoteRequest,
    RealtimeChannel, RemoteEvent, SessionApi,
};
pub use session::{GeneratedNote, Session, SessionPatch, SessionStatus};
pub use sync::{EditableField, SessionSyncManager};
pub use transcript::{ChunkStats, SyncState, TranscriptChunk, TranscriptChunkStore};
