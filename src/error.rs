use thiserror::Error;

use crate::capture::CaptureState;

/// Errors surfaced by the capture lifecycle.
///
/// Invalid transitions are rejected synchronously rather than silently
/// ignored, so callers can distinguish "pause did nothing" from "pause was
/// not legal here".
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The input device could not be acquired, either because the host
    /// denied access or because another controller already holds it.
    #[error("microphone unavailable: {0}")]
    Permission(String),

    /// `start()` was called while capture is already starting or active.
    #[error("capture already starting or active")]
    AlreadyStarting,

    /// The requested operation is not valid in the current state.
    #[error("cannot {operation} while capture is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: CaptureState,
    },

    /// The audio backend failed while starting or stopping.
    #[error("audio backend error: {0:#}")]
    Backend(anyhow::Error),
}

/// Errors surfaced by the note-generation pipeline.
///
/// Stage failures are not errors at this level; they are reported through
/// `PipelineResult` so that optional-stage failures can coexist with a
/// successful run. Only contract violations reject the call outright.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The transcript was empty or whitespace; no stage was executed.
    #[error("transcript is empty, nothing to generate a note from")]
    EmptyTranscript,

    /// A pipeline is already running for this session.
    #[error("a note-generation run is already in progress for session {0}")]
    AlreadyRunning(String),
}
