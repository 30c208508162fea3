//! Speaker diarization
//!
//! Assigns a speaker label to each final transcript fragment. Two strategies
//! cover the two ways audio reaches the microphone:
//!
//! - `Direct`: a live two-party conversation through one microphone. Speakers
//!   strictly alternate after every final fragment, starting from the
//!   provider. No timing signal is needed.
//! - `Playback`: audio played back from another device (e.g. a recorded
//!   call). The speaker flips when the silence gap since the previous final
//!   fragment exceeds a threshold, and is retained otherwise.
//!
//! The diarizer must see every final fragment exactly once, in arrival
//! order. State is scoped to one capture run: a new `SpeakerDiarizer` is
//! built each time capture starts, so nothing leaks across sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who said a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Provider,
    Patient,
}

impl Speaker {
    pub fn other(self) -> Speaker {
        match self {
            Speaker::Provider => Speaker::Patient,
            Speaker::Patient => Speaker::Provider,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Provider => write!(f, "Provider"),
            Speaker::Patient => write!(f, "Patient"),
        }
    }
}

/// How the conversation reaches the microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiarizationMode {
    /// Live two-party capture through one input device.
    Direct,
    /// Audio played back from another source, diarized by timing gaps.
    Playback,
}

/// A final fragment with its speaker attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledFragment {
    pub speaker: Speaker,
    pub text: String,
}

/// Per-capture diarization state.
///
/// Starts at `Provider` / `t=0` and is discarded when capture stops;
/// restarting capture always begins from a fresh diarizer.
#[derive(Debug)]
pub struct SpeakerDiarizer {
    mode: DiarizationMode,
    speaker: Speaker,
    last_timestamp_ms: u64,
    gap_threshold_ms: u64,
    fragments_seen: u64,
}

impl SpeakerDiarizer {
    pub fn new(mode: DiarizationMode, gap_threshold_ms: u64) -> Self {
        Self {
            mode,
            speaker: Speaker::Provider,
            last_timestamp_ms: 0,
            gap_threshold_ms,
            fragments_seen: 0,
        }
    }

    /// Label one final fragment. Must be called exactly once per final
    /// fragment, in arrival order.
    pub fn label_fragment(&mut self, text: &str, timestamp_ms: u64) -> LabeledFragment {
        let speaker = match self.mode {
            DiarizationMode::Direct => {
                // First fragment is the provider's; every fragment after
                // that flips the turn.
                if self.fragments_seen == 0 {
                    Speaker::Provider
                } else {
                    self.speaker.other()
                }
            }
            DiarizationMode::Playback => {
                let gap = timestamp_ms.saturating_sub(self.last_timestamp_ms);
                if gap > self.gap_threshold_ms {
                    self.speaker.other()
                } else {
                    self.speaker
                }
            }
        };

        self.speaker = speaker;
        self.last_timestamp_ms = timestamp_ms;
        self.fragments_seen += 1;

        LabeledFragment {
            speaker,
            text: text.to_string(),
        }
    }

    pub fn mode(&self) -> DiarizationMode {
        self.mode
    }

    pub fn current_speaker(&self) -> Speaker {
        self.speaker
    }
}
