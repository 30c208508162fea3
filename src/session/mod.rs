//! Session data model
//!
//! A `Session` represents one clinical encounter: who it is for, where it is
//! in its lifecycle, and the note generated from its transcript. Sessions are
//! created by the embedding application and mutated here through
//! `SessionSyncManager` and the note-generation pipeline; they are never
//! deleted by this crate.

mod model;

pub use model::{GeneratedNote, Session, SessionPatch, SessionStatus};
