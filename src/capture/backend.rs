use anyhow::Result;
use tokio::sync::mpsc;

/// One recognition event from the speech backend.
#[derive(Debug, Clone)]
pub struct TranscriptEvent {
    /// Recognized text so far (interim) or the settled fragment (final).
    pub text: String,

    /// Interim events are advisory and must never be persisted.
    pub is_final: bool,

    /// Milliseconds since capture started. Drives playback-mode diarization.
    pub timestamp_ms: u64,
}

/// Speech-recognition backend trait.
///
/// Implementations wrap whatever recognizer the host platform provides
/// (native speech APIs, a streaming STT service, a scripted double in
/// tests). The controller moves the backend into its event-loop task and
/// stops it when the loop exits.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire the input device and begin continuous recognition.
    ///
    /// Returns a channel receiver delivering recognition events until the
    /// backend is stopped. Fails if the device cannot be acquired.
    async fn start(&mut self, device_id: Option<&str>) -> Result<mpsc::Receiver<TranscriptEvent>>;

    /// Stop recognition and release the input device.
    async fn stop(&mut self) -> Result<()>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
