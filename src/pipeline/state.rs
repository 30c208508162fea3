use serde::{Deserialize, Serialize};

use crate::remote::{CodeSuggestion, DetailLevel};
use crate::session::GeneratedNote;

/// Execution status of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One step of the note-generation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub name: String,

    /// Required stages abort the run on failure; optional stages do not.
    pub required: bool,

    pub status: StageStatus,

    /// Failure reason, when `status` is `Failed`.
    pub error: Option<String>,
}

impl StageDescriptor {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
            status: StageStatus::Pending,
            error: None,
        }
    }
}

/// Observable state of one pipeline run.
///
/// Created per `run_complete_pipeline` invocation and discarded when the
/// invocation resolves or a newer run supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub is_running: bool,
    pub stages: Vec<StageDescriptor>,
    pub errors: Vec<String>,
}

impl WorkflowState {
    pub fn new(stages: Vec<StageDescriptor>) -> Self {
        Self {
            is_running: false,
            stages,
            errors: Vec::new(),
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.name == name)
    }
}

/// Caller-supplied options for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Free-form clinical context passed through to the generation service.
    pub context: Option<String>,

    pub detail_level: DetailLevel,

    /// Note template to generate against.
    pub template_id: Option<String>,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// True when every required stage succeeded.
    pub success: bool,

    /// The generated note; absent whenever a required stage failed.
    pub note: Option<GeneratedNote>,

    /// Every stage failure observed during the run, required and optional.
    pub errors: Vec<String>,

    /// Output of the optional task-extraction stage.
    pub tasks: Vec<String>,

    /// Output of the optional coding-suggestion stage.
    pub code_suggestions: Vec<CodeSuggestion>,
}
