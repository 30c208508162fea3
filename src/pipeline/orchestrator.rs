use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::note::parse_note_payload;
use super::observer::StateObserver;
use super::state::{PipelineOptions, PipelineResult, StageDescriptor, StageStatus, WorkflowState};
use crate::error::PipelineError;
use crate::remote::{NoteGenerationService, NoteRequest, SessionApi};
use crate::session::{GeneratedNote, SessionPatch, SessionStatus};

const STAGE_PREPROCESS: &str = "preprocess";
const STAGE_EXTRACT_TASKS: &str = "extract_tasks";
const STAGE_SUGGEST_CODES: &str = "suggest_codes";
const STAGE_GENERATE_NOTE: &str = "generate_note";
const STAGE_PERSIST_NOTE: &str = "persist_note";

/// Runs the staged transcript-to-note pipeline.
///
/// One orchestrator belongs to one call site at a time. Constructing a new
/// orchestrator against the same observer supersedes the previous one: its
/// in-flight run keeps executing, but its state updates stop reaching the
/// caller.
pub struct NoteGenerationOrchestrator {
    id: Uuid,
    service: Arc<dyn NoteGenerationService>,
    sessions: Arc<dyn SessionApi>,
    observer: Arc<StateObserver>,
    running: AtomicBool,
}

impl NoteGenerationOrchestrator {
    pub fn new(
        service: Arc<dyn NoteGenerationService>,
        sessions: Arc<dyn SessionApi>,
        observer: Arc<StateObserver>,
    ) -> Self {
        let id = Uuid::new_v4();
        observer.attach(id);
        Self {
            id,
            service,
            sessions,
            observer,
            running: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn stages() -> Vec<StageDescriptor> {
        vec![
            StageDescriptor::new(STAGE_PREPROCESS, true),
            StageDescriptor::new(STAGE_EXTRACT_TASKS, false),
            StageDescriptor::new(STAGE_SUGGEST_CODES, false),
            StageDescriptor::new(STAGE_GENERATE_NOTE, true),
            StageDescriptor::new(STAGE_PERSIST_NOTE, true),
        ]
    }

    /// Run every stage in order against the assembled transcript.
    ///
    /// Rejects an empty transcript before any stage executes. A required
    /// stage failure aborts the run with `success = false` and no note; an
    /// optional stage failure is recorded and the run continues.
    pub async fn run_complete_pipeline(
        &self,
        session_id: &str,
        transcript: &str,
        options: PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        if transcript.trim().is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::AlreadyRunning(session_id.to_string()));
        }

        info!(session_id, orchestrator = %self.id, "starting note-generation pipeline");

        let mut state = WorkflowState::new(Self::stages());
        state.is_running = true;
        self.publish(&state);

        let result = self.run_stages(session_id, transcript, options, &mut state).await;

        state.is_running = false;
        self.publish(&state);
        self.running.store(false, Ordering::SeqCst);

        info!(
            session_id,
            success = result.success,
            errors = result.errors.len(),
            "note-generation pipeline finished"
        );

        Ok(result)
    }

    async fn run_stages(
        &self,
        session_id: &str,
        transcript: &str,
        options: PipelineOptions,
        state: &mut WorkflowState,
    ) -> PipelineResult {
        let mut result = PipelineResult {
            success: false,
            note: None,
            errors: Vec::new(),
            tasks: Vec::new(),
            code_suggestions: Vec::new(),
        };

        // preprocess: local transcript normalization, required.
        self.begin(state, STAGE_PREPROCESS);
        let cleaned = normalize_transcript(transcript);
        self.succeed(state, STAGE_PREPROCESS);

        // extract_tasks: optional, failure recorded but never fatal.
        self.begin(state, STAGE_EXTRACT_TASKS);
        match self.service.extract_tasks(&cleaned).await {
            Ok(tasks) => {
                result.tasks = tasks;
                self.succeed(state, STAGE_EXTRACT_TASKS);
            }
            Err(e) => self.fail(state, STAGE_EXTRACT_TASKS, &mut result, e),
        }

        // suggest_codes: optional.
        self.begin(state, STAGE_SUGGEST_CODES);
        match self.service.suggest_codes(&cleaned).await {
            Ok(codes) => {
                result.code_suggestions = codes;
                self.succeed(state, STAGE_SUGGEST_CODES);
            }
            Err(e) => self.fail(state, STAGE_SUGGEST_CODES, &mut result, e),
        }

        // generate_note: required; later stages stay pending on failure.
        self.begin(state, STAGE_GENERATE_NOTE);
        let request = NoteRequest {
            session_id: session_id.to_string(),
            transcript: cleaned,
            context: options.context,
            detail_level: options.detail_level,
            template_id: options.template_id,
        };
        let note: GeneratedNote = match self.service.generate_note(&request).await {
            Ok(raw) => {
                self.succeed(state, STAGE_GENERATE_NOTE);
                // Parsing never fails; unparseable payloads become plain text.
                parse_note_payload(&raw)
            }
            Err(e) => {
                self.fail(state, STAGE_GENERATE_NOTE, &mut result, e);
                return result;
            }
        };

        // persist_note: required.
        self.begin(state, STAGE_PERSIST_NOTE);
        let patch = SessionPatch::note(note.clone(), SessionStatus::Review);
        match self.sessions.update(session_id, patch).await {
            Ok(()) => self.succeed(state, STAGE_PERSIST_NOTE),
            Err(e) => {
                self.fail(state, STAGE_PERSIST_NOTE, &mut result, e);
                return result;
            }
        }

        result.success = true;
        result.note = Some(note);
        result
    }

    fn begin(&self, state: &mut WorkflowState, name: &str) {
        self.set_status(state, name, StageStatus::Running, None);
    }

    fn succeed(&self, state: &mut WorkflowState, name: &str) {
        self.set_status(state, name, StageStatus::Succeeded, None);
    }

    fn fail(
        &self,
        state: &mut WorkflowState,
        name: &str,
        result: &mut PipelineResult,
        error: anyhow::Error,
    ) {
        let message = format!("{name}: {error:#}");
        warn!("pipeline stage failed: {message}");
        result.errors.push(message.clone());
        state.errors.push(message.clone());
        self.set_status(state, name, StageStatus::Failed, Some(message));
    }

    fn set_status(
        &self,
        state: &mut WorkflowState,
        name: &str,
        status: StageStatus,
        error: Option<String>,
    ) {
        if let Some(stage) = state.stages.iter_mut().find(|s| s.name == name) {
            stage.status = status;
            stage.error = error;
        }
        self.publish(state);
    }

    fn publish(&self, state: &WorkflowState) {
        self.observer.publish(self.id, state);
    }
}

/// Collapse whitespace runs within each line and drop blank lines, keeping
/// the one-line-per-turn shape of a diarized transcript. Recognition
/// backends are inconsistent about spacing around fragment boundaries.
fn normalize_transcript(transcript: &str) -> String {
    transcript
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
