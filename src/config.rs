use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration for the transcription core.
///
/// Every timing constant the core relies on is tunable here rather than
/// hard-coded; defaults match the production values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub capture: CaptureConfig,
    pub diarization: DiarizationConfig,
    pub persistence: PersistenceConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Hard cap on continuous recording, in seconds. Reaching it stops
    /// capture and signals the caller to run note generation.
    pub max_duration_secs: u64,

    /// Preferred input device id, if the host exposes one.
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiarizationConfig {
    /// Silence gap (ms) after which playback-mode diarization flips speaker.
    pub gap_threshold_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// First retry delay in milliseconds; doubles on each attempt.
    pub backoff_base_ms: u64,

    /// Retry attempts after the initial upsert before a chunk is marked failed.
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Idle window (ms) before a field edit is written out.
    pub debounce_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 600, // 10 minutes
            device_id: None,
        }
    }
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: 3000,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: 1000, // 1s, 2s, 4s
            max_retries: 3,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

impl CaptureConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl CoreConfig {
    /// Load configuration from a file, falling back to defaults for any
    /// section the file omits.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
