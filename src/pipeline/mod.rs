//! Note-generation pipeline
//!
//! Turns an assembled transcript into a structured clinical note through a
//! fixed sequence of stages. Required stages abort the run on failure;
//! optional stages only record their error and let the run continue. Stage
//! transitions are reported through a `StateObserver` keyed by orchestrator
//! identity, so a superseded run can no longer reach the caller's state.

mod note;
mod observer;
mod orchestrator;
mod state;

pub use note::parse_note_payload;
pub use observer::StateObserver;
pub use orchestrator::NoteGenerationOrchestrator;
pub use state::{PipelineOptions, PipelineResult, StageDescriptor, StageStatus, WorkflowState};
