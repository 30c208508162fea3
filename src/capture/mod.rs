//! Audio capture lifecycle
//!
//! `AudioCaptureController` owns the microphone for one client and drives the
//! `Idle → Starting → Recording ⇄ Paused → Stopping → Idle` state machine.
//! Speech recognition itself lives behind the `AudioBackend` trait; the
//! controller consumes its `(text, is_final)` events, diarizes the final
//! ones, and appends them to the session's `TranscriptChunkStore`.

mod backend;
mod controller;

pub use backend::{AudioBackend, TranscriptEvent};
pub use controller::{
    AudioCaptureController, CaptureEvent, CaptureOptions, CaptureState, MicrophoneSlot,
};
