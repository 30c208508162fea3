use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::backend::{AudioBackend, TranscriptEvent};
use crate::config::{CaptureConfig, DiarizationConfig};
use crate::diarize::{DiarizationMode, SpeakerDiarizer};
use crate::error::CaptureError;
use crate::transcript::{TranscriptChunk, TranscriptChunkStore};

/// Capture lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Recording,
    Paused,
    Stopping,
    Error,
}

/// Event delivered to the caller while capture runs.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Interim recognition text, display only.
    Interim(String),

    /// A final fragment, diarized and appended to the chunk store.
    Final(TranscriptChunk),

    /// The continuous-duration cap was reached; capture has already stopped
    /// and all pending chunks are flushed. Emitted exactly once.
    MaxDurationReached,
}

/// Options for one capture run.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Specific input device to open; falls back to the configured default.
    pub device_id: Option<String>,

    /// Diarization strategy for this run.
    pub mode: DiarizationMode,
}

/// Exclusive claim on the client's microphone.
///
/// All controllers created for one client share a slot; acquiring it while
/// held fails fast instead of queuing.
#[derive(Clone, Default)]
pub struct MicrophoneSlot {
    inner: Arc<Mutex<()>>,
}

impl MicrophoneSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_acquire(&self) -> Result<OwnedMutexGuard<()>, CaptureError> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| CaptureError::Permission("input device held by another capture".into()))
    }
}

/// Owns the microphone/stream lifecycle and raw transcript events.
pub struct AudioCaptureController {
    config: CaptureConfig,
    diarization: DiarizationConfig,
    slot: MicrophoneSlot,
    store: Arc<TranscriptChunkStore>,

    /// Present while no capture task holds the backend.
    backend: Option<Box<dyn AudioBackend>>,

    state: Arc<Mutex<CaptureState>>,
    paused: Arc<AtomicBool>,
    shutdown: Arc<Notify>,

    /// Event-loop task; returns the backend so capture can restart.
    task: Option<JoinHandle<Box<dyn AudioBackend>>>,
}

impl AudioCaptureController {
    pub fn new(
        config: CaptureConfig,
        diarization: DiarizationConfig,
        slot: MicrophoneSlot,
        backend: Box<dyn AudioBackend>,
        store: Arc<TranscriptChunkStore>,
    ) -> Self {
        Self {
            config,
            diarization,
            slot,
            store,
            backend: Some(backend),
            state: Arc::new(Mutex::new(CaptureState::Idle)),
            paused: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            task: None,
        }
    }

    pub async fn state(&self) -> CaptureState {
        *self.state.lock().await
    }

    /// Acquire the microphone and begin continuous recognition.
    ///
    /// Returns the event receiver for this run. Rejects with
    /// `AlreadyStarting` while a run is starting or active, and with
    /// `Permission` when the input device cannot be acquired.
    pub async fn start(
        &mut self,
        options: CaptureOptions,
    ) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        // Reclaim the backend if a previous run ended on its own (duration
        // cap or backend stream close).
        if self.task.as_ref().is_some_and(|t| t.is_finished()) {
            self.reclaim_backend().await;
        }

        {
            let mut state = self.state.lock().await;
            match *state {
                CaptureState::Idle | CaptureState::Error => {}
                CaptureState::Starting | CaptureState::Recording | CaptureState::Paused => {
                    return Err(CaptureError::AlreadyStarting);
                }
                CaptureState::Stopping => {
                    return Err(CaptureError::InvalidState {
                        operation: "start",
                        state: *state,
                    });
                }
            }
            *state = CaptureState::Starting;
        }

        let mic_guard = match self.slot.try_acquire() {
            Ok(guard) => guard,
            Err(e) => {
                *self.state.lock().await = CaptureState::Idle;
                return Err(e);
            }
        };

        let Some(mut backend) = self.backend.take() else {
            // Only possible if a previous capture task panicked.
            *self.state.lock().await = CaptureState::Error;
            return Err(CaptureError::Backend(anyhow::anyhow!(
                "audio backend lost by a previous capture task"
            )));
        };

        let device_id = options
            .device_id
            .as_deref()
            .or(self.config.device_id.as_deref());

        info!(backend = backend.name(), ?device_id, "starting capture");

        let backend_rx = match backend.start(device_id).await {
            Ok(rx) => rx,
            Err(e) => {
                error!("failed to acquire input device: {e:#}");
                self.backend = Some(backend);
                *self.state.lock().await = CaptureState::Error;
                drop(mic_guard);
                return Err(CaptureError::Permission(format!("{e:#}")));
            }
        };

        self.paused.store(false, Ordering::SeqCst);
        // Fresh shutdown signal per run; a stop() issued while idle must not
        // leave a stored permit that would end this run immediately.
        self.shutdown = Arc::new(Notify::new());
        *self.state.lock().await = CaptureState::Recording;

        // Fresh diarization state on every start; nothing leaks across runs.
        let diarizer = SpeakerDiarizer::new(options.mode, self.diarization.gap_threshold_ms);

        let (events_tx, events_rx) = mpsc::channel(100);

        let task = tokio::spawn(Self::run_event_loop(
            backend,
            backend_rx,
            diarizer,
            Arc::clone(&self.store),
            events_tx,
            Arc::clone(&self.state),
            Arc::clone(&self.paused),
            Arc::clone(&self.shutdown),
            self.config.max_duration(),
            mic_guard,
        ));
        self.task = Some(task);

        Ok(events_rx)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_event_loop(
        mut backend: Box<dyn AudioBackend>,
        mut backend_rx: mpsc::Receiver<TranscriptEvent>,
        mut diarizer: SpeakerDiarizer,
        store: Arc<TranscriptChunkStore>,
        events_tx: mpsc::Sender<CaptureEvent>,
        state: Arc<Mutex<CaptureState>>,
        paused: Arc<AtomicBool>,
        shutdown: Arc<Notify>,
        max_duration: std::time::Duration,
        mic_guard: OwnedMutexGuard<()>,
    ) -> Box<dyn AudioBackend> {
        let cap = tokio::time::sleep_until(Instant::now() + max_duration);
        tokio::pin!(cap);

        let mut hit_cap = false;

        loop {
            tokio::select! {
                _ = shutdown.notified() => break,

                _ = &mut cap => {
                    hit_cap = true;
                    break;
                }

                event = backend_rx.recv() => {
                    let Some(event) = event else {
                        warn!("backend event stream closed");
                        break;
                    };

                    if paused.load(Ordering::SeqCst) {
                        continue;
                    }

                    if !event.is_final {
                        let _ = events_tx.send(CaptureEvent::Interim(event.text)).await;
                        continue;
                    }

                    let fragment = diarizer.label_fragment(&event.text, event.timestamp_ms);
                    let chunk = store.add_chunk(fragment.speaker, fragment.text).await;
                    let _ = events_tx.send(CaptureEvent::Final(chunk)).await;
                }
            }
        }

        if let Err(e) = backend.stop().await {
            error!("failed to stop audio backend: {e:#}");
        }

        if hit_cap {
            // Auto-stop: flush, go idle, then signal so the caller can kick
            // off note generation against a complete transcript.
            info!("capture duration cap reached, stopping");
            store.save_all_pending_chunks().await;
            *state.lock().await = CaptureState::Idle;
            let _ = events_tx.send(CaptureEvent::MaxDurationReached).await;
        }

        drop(mic_guard);
        backend
    }

    /// Pause recognition. Valid only while `Recording`.
    pub async fn pause(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().await;
        if *state != CaptureState::Recording {
            return Err(CaptureError::InvalidState {
                operation: "pause",
                state: *state,
            });
        }
        self.paused.store(true, Ordering::SeqCst);
        *state = CaptureState::Paused;
        info!("capture paused");
        Ok(())
    }

    /// Resume recognition. Valid only while `Paused`.
    pub async fn resume(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().await;
        if *state != CaptureState::Paused {
            return Err(CaptureError::InvalidState {
                operation: "resume",
                state: *state,
            });
        }
        self.paused.store(false, Ordering::SeqCst);
        *state = CaptureState::Recording;
        info!("capture resumed");
        Ok(())
    }

    /// Stop capture, release the device, and flush all pending chunks.
    ///
    /// Always safe to call; stopping an idle controller only flushes the
    /// store. Returns once every chunk persist has settled, so the caller
    /// can hand the transcript to note generation immediately.
    pub async fn stop(&mut self) -> Result<(), CaptureError> {
        {
            let mut state = self.state.lock().await;
            if matches!(
                *state,
                CaptureState::Recording | CaptureState::Paused | CaptureState::Starting
            ) {
                *state = CaptureState::Stopping;
            }
        }

        self.shutdown.notify_one();
        self.reclaim_backend().await;
        self.store.save_all_pending_chunks().await;

        *self.state.lock().await = CaptureState::Idle;
        info!("capture stopped");
        Ok(())
    }

    async fn reclaim_backend(&mut self) {
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(backend) => self.backend = Some(backend),
                Err(e) => error!("capture task panicked: {e}"),
            }
        }
    }
}
