// Shared test doubles for the collaborator contracts.
//
// Each double records what it was asked to do and can be scripted to fail:
// the persistence double fails a configurable number of leading attempts per
// chunk, the note service can fail any stage by name, and the scripted
// backend replays a canned sequence of recognition events.

// Not every test binary uses every double.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use scribe_core::{
    AudioBackend, ChunkPersistence, CodeSuggestion, NoteGenerationService, NoteRequest,
    RealtimeChannel, RemoteEvent, Session, SessionApi, SessionPatch, SessionStatus,
    TranscriptChunk, TranscriptEvent,
};

/// Route tracing output through the libtest capture so failing tests show
/// the crate's log lines. Idempotent; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn draft_session(id: &str) -> Session {
    Session {
        id: id.to_string(),
        patient_name: "Jordan Doe".to_string(),
        scheduled_at: chrono::Utc::now(),
        status: SessionStatus::Draft,
        template_id: None,
        note: None,
    }
}

/// In-memory chunk persistence with per-chunk failure injection.
#[derive(Default)]
pub struct MockPersistence {
    /// Number of leading attempts to fail for every chunk.
    pub fail_first: usize,
    /// Artificial upsert latency per sequence number, to reorder
    /// persist completions.
    pub delays: HashMap<u64, std::time::Duration>,
    attempts: Mutex<HashMap<u64, usize>>,
    saved: Mutex<Vec<(String, u64, String)>>,
}

impl MockPersistence {
    pub fn failing_first(fail_first: usize) -> Self {
        Self {
            fail_first,
            ..Default::default()
        }
    }

    pub fn delaying(delays: HashMap<u64, std::time::Duration>) -> Self {
        Self {
            delays,
            ..Default::default()
        }
    }

    pub fn saved(&self) -> Vec<(String, u64, String)> {
        self.saved.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, sequence: u64) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(&sequence)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl ChunkPersistence for MockPersistence {
    async fn upsert_chunk(&self, session_id: &str, chunk: &TranscriptChunk) -> Result<()> {
        if let Some(delay) = self.delays.get(&chunk.sequence) {
            tokio::time::sleep(*delay).await;
        }

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(chunk.sequence).or_insert(0);
            *entry += 1;
            *entry
        };

        if attempt <= self.fail_first {
            return Err(anyhow!("transient storage failure"));
        }

        self.saved.lock().unwrap().push((
            session_id.to_string(),
            chunk.sequence,
            chunk.text.clone(),
        ));
        Ok(())
    }
}

/// Note-generation service returning a fixed payload, with per-stage
/// failure injection.
pub struct MockNoteService {
    pub note_payload: String,
    pub failing_stages: HashSet<&'static str>,
    pub tasks: Vec<String>,
    pub requests: Mutex<Vec<NoteRequest>>,
    /// Artificial latency for `generate_note`, to keep a run in flight.
    pub generation_delay: Option<std::time::Duration>,
}

impl MockNoteService {
    pub fn returning(note_payload: &str) -> Self {
        Self {
            note_payload: note_payload.to_string(),
            failing_stages: HashSet::new(),
            tasks: vec!["order labs".to_string()],
            requests: Mutex::new(Vec::new()),
            generation_delay: None,
        }
    }

    pub fn failing(mut self, stage: &'static str) -> Self {
        self.failing_stages.insert(stage);
        self
    }

    pub fn slow_generation(mut self, delay: std::time::Duration) -> Self {
        self.generation_delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl NoteGenerationService for MockNoteService {
    async fn generate_note(&self, request: &NoteRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.generation_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_stages.contains("generate_note") {
            return Err(anyhow!("generation service unavailable"));
        }
        Ok(self.note_payload.clone())
    }

    async fn extract_tasks(&self, _transcript: &str) -> Result<Vec<String>> {
        if self.failing_stages.contains("extract_tasks") {
            return Err(anyhow!("task extraction timed out"));
        }
        Ok(self.tasks.clone())
    }

    async fn suggest_codes(&self, _transcript: &str) -> Result<Vec<CodeSuggestion>> {
        if self.failing_stages.contains("suggest_codes") {
            return Err(anyhow!("coding service unavailable"));
        }
        Ok(vec![CodeSuggestion {
            code: "99213".to_string(),
            description: "Established patient visit".to_string(),
        }])
    }
}

/// Session API double recording every update.
pub struct MockSessionApi {
    pub session: Mutex<Session>,
    pub updates: Mutex<Vec<SessionPatch>>,
    pub fail_updates: bool,
}

impl MockSessionApi {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
            updates: Mutex::new(Vec::new()),
            fail_updates: false,
        }
    }

    pub fn failing(session: Session) -> Self {
        Self {
            fail_updates: true,
            ..Self::new(session)
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SessionApi for MockSessionApi {
    async fn get(&self, _session_id: &str) -> Result<Session> {
        Ok(self.session.lock().unwrap().clone())
    }

    async fn update(&self, _session_id: &str, fields: SessionPatch) -> Result<()> {
        if self.fail_updates {
            return Err(anyhow!("session service unavailable"));
        }
        self.session.lock().unwrap().apply(&fields);
        self.updates.lock().unwrap().push(fields);
        Ok(())
    }
}

/// Realtime channel backed by an in-process mpsc sender.
pub struct MockRealtimeChannel {
    rx: Mutex<Option<mpsc::Receiver<RemoteEvent>>>,
}

impl MockRealtimeChannel {
    pub fn new() -> (Arc<Self>, mpsc::Sender<RemoteEvent>) {
        let (tx, rx) = mpsc::channel(100);
        let channel = Arc::new(Self {
            rx: Mutex::new(Some(rx)),
        });
        (channel, tx)
    }
}

#[async_trait::async_trait]
impl RealtimeChannel for MockRealtimeChannel {
    async fn subscribe(&self, _session_id: &str) -> Result<BoxStream<'static, RemoteEvent>> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("already subscribed"))?;
        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })))
    }
}

/// Speech backend replaying a scripted event sequence.
pub struct ScriptedBackend {
    events: Mutex<Vec<TranscriptEvent>>,
    /// Times `start` ran; shared so tests can probe after the controller
    /// takes ownership of the backend.
    pub started: Arc<AtomicUsize>,
    /// Times `stop` ran.
    pub stopped: Arc<AtomicUsize>,
    /// When true, `start` fails as if the device could not be acquired.
    pub deny_device: bool,
    /// Keep the event channel open after the script runs out, so capture
    /// keeps running until stopped externally.
    pub hold_open: bool,
    /// Live sender while `hold_open` capture runs; tests push extra events
    /// through it.
    pub held_tx: Arc<Mutex<Option<mpsc::Sender<TranscriptEvent>>>>,
}

impl ScriptedBackend {
    pub fn new(events: Vec<TranscriptEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            started: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicUsize::new(0)),
            deny_device: false,
            hold_open: false,
            held_tx: Arc::new(Mutex::new(None)),
        }
    }

    pub fn holding_open(events: Vec<TranscriptEvent>) -> Self {
        Self {
            hold_open: true,
            ..Self::new(events)
        }
    }

    pub fn denying() -> Self {
        Self {
            deny_device: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn final_event(text: &str, timestamp_ms: u64) -> TranscriptEvent {
        TranscriptEvent {
            text: text.to_string(),
            is_final: true,
            timestamp_ms,
        }
    }

    pub fn interim_event(text: &str, timestamp_ms: u64) -> TranscriptEvent {
        TranscriptEvent {
            text: text.to_string(),
            is_final: false,
            timestamp_ms,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self, _device_id: Option<&str>) -> Result<mpsc::Receiver<TranscriptEvent>> {
        if self.deny_device {
            return Err(anyhow!("microphone permission denied"));
        }

        self.started.fetch_add(1, Ordering::SeqCst);

        let events: Vec<TranscriptEvent> = self.events.lock().unwrap().drain(..).collect();
        let (tx, rx) = mpsc::channel(100);

        for event in events {
            tx.send(event).await.expect("scripted channel has capacity");
        }

        if self.hold_open {
            *self.held_tx.lock().unwrap() = Some(tx);
        }

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        *self.held_tx.lock().unwrap() = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
