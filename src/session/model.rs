use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Capture and editing still in progress.
    Draft,
    /// A note has been generated and is awaiting provider review.
    Review,
    /// Signed off; no further edits expected.
    Finalized,
}

/// The note produced by the generation pipeline.
///
/// `text` is always populated and is the canonical representation. When the
/// generation service returned JSON (fenced or bare), `structured` carries
/// the parsed form as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedNote {
    /// Canonical note text, with any code fences stripped.
    pub text: String,

    /// Parsed structured note, when the raw payload was valid JSON.
    pub structured: Option<serde_json::Value>,
}

impl GeneratedNote {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }
}

/// One clinical encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,

    /// Patient display name shown in the encounter header.
    pub patient_name: String,

    /// When the encounter is scheduled to take place.
    pub scheduled_at: DateTime<Utc>,

    /// Lifecycle status.
    pub status: SessionStatus,

    /// Selected note template, if any.
    pub template_id: Option<String>,

    /// Generated note, once the pipeline has produced one.
    pub note: Option<GeneratedNote>,
}

impl Session {
    /// Create a fresh draft session for a new encounter.
    pub fn new_draft(patient_name: impl Into<String>, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_name: patient_name.into(),
            scheduled_at,
            status: SessionStatus::Draft,
            template_id: None,
            note: None,
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(name) = &patch.patient_name {
            self.patient_name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(template_id) = &patch.template_id {
            self.template_id = Some(template_id.clone());
        }
        if let Some(note) = &patch.note {
            self.note = Some(note.clone());
        }
    }
}

/// Partial update sent to the session CRUD API.
///
/// `None` fields are left untouched by `update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    pub patient_name: Option<String>,
    pub status: Option<SessionStatus>,
    pub template_id: Option<String>,
    pub note: Option<GeneratedNote>,
}

impl SessionPatch {
    pub fn patient_name(name: impl Into<String>) -> Self {
        Self {
            patient_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn note(note: GeneratedNote, status: SessionStatus) -> Self {
        Self {
            note: Some(note),
            status: Some(status),
            ..Default::default()
        }
    }
}
