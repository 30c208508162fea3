use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::remote::{RealtimeChannel, RemoteEvent, SessionApi};
use crate::session::{Session, SessionPatch};

/// Scalar session fields the user edits directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    PatientName,
    TemplateId,
}

impl EditableField {
    const ALL: [EditableField; 2] = [EditableField::PatientName, EditableField::TemplateId];

    fn get(self, session: &Session) -> String {
        match self {
            EditableField::PatientName => session.patient_name.clone(),
            EditableField::TemplateId => session.template_id.clone().unwrap_or_default(),
        }
    }

    fn set(self, session: &mut Session, value: &str) {
        match self {
            EditableField::PatientName => session.patient_name = value.to_string(),
            EditableField::TemplateId => session.template_id = Some(value.to_string()),
        }
    }

    fn patch(self, value: &str) -> SessionPatch {
        match self {
            EditableField::PatientName => SessionPatch::patient_name(value),
            EditableField::TemplateId => SessionPatch {
                template_id: Some(value.to_string()),
                ..Default::default()
            },
        }
    }

    fn carried_by(self, patch: &SessionPatch) -> bool {
        match self {
            EditableField::PatientName => patch.patient_name.is_some(),
            EditableField::TemplateId => patch.template_id.is_some(),
        }
    }

    fn clear_in(self, patch: &mut SessionPatch) {
        match self {
            EditableField::PatientName => patch.patient_name = None,
            EditableField::TemplateId => patch.template_id = None,
        }
    }
}

#[derive(Default)]
struct FieldState {
    /// Set while an edit is waiting on its debounce window or its write.
    editing: bool,
    pending: Option<JoinHandle<()>>,
}

struct SyncInner {
    session: Session,
    /// Last value known to be persisted, per editable field.
    persisted: HashMap<EditableField, String>,
    fields: HashMap<EditableField, FieldState>,
}

/// Debounced autosave of editable session fields, reconciled against the
/// realtime change feed.
pub struct SessionSyncManager {
    sessions: Arc<dyn SessionApi>,
    debounce: Duration,
    inner: Arc<Mutex<SyncInner>>,
    listener: Option<JoinHandle<()>>,
}

impl SessionSyncManager {
    pub fn new(session: Session, sessions: Arc<dyn SessionApi>, config: SyncConfig) -> Self {
        let persisted = EditableField::ALL
            .iter()
            .map(|&f| (f, f.get(&session)))
            .collect();

        Self {
            sessions,
            debounce: config.debounce(),
            inner: Arc::new(Mutex::new(SyncInner {
                session,
                persisted,
                fields: HashMap::new(),
            })),
            listener: None,
        }
    }

    /// Current local view of the session.
    pub async fn session(&self) -> Session {
        self.inner.lock().await.session.clone()
    }

    /// Record a user edit and schedule its debounced write.
    ///
    /// A newer edit supersedes the pending one; the write is skipped when
    /// the value settles back to what is already persisted.
    pub async fn edit_field(&self, field: EditableField, value: impl Into<String>) {
        let value = value.into();
        let mut inner = self.inner.lock().await;
        field.set(&mut inner.session, &value);

        let state = inner.fields.entry(field).or_default();
        state.editing = true;
        if let Some(task) = state.pending.take() {
            task.abort();
        }

        let task = tokio::spawn(Self::debounced_write(
            Arc::clone(&self.inner),
            Arc::clone(&self.sessions),
            field,
            self.debounce,
        ));
        inner.fields.entry(field).or_default().pending = Some(task);
    }

    async fn debounced_write(
        inner: Arc<Mutex<SyncInner>>,
        sessions: Arc<dyn SessionApi>,
        field: EditableField,
        debounce: Duration,
    ) {
        tokio::time::sleep(debounce).await;
        Self::write_field(&inner, &sessions, field).await;
    }

    async fn write_field(
        inner: &Arc<Mutex<SyncInner>>,
        sessions: &Arc<dyn SessionApi>,
        field: EditableField,
    ) {
        let (session_id, value) = {
            let mut guard = inner.lock().await;
            let value = field.get(&guard.session);

            if guard.persisted.get(&field) == Some(&value) {
                // Rapid keystrokes settled back to the persisted value;
                // no round-trip needed.
                debug!(?field, "skipping write, value unchanged");
                if let Some(state) = guard.fields.get_mut(&field) {
                    state.editing = false;
                    state.pending = None;
                }
                return;
            }

            (guard.session.id.clone(), value)
        };

        match sessions.update(&session_id, field.patch(&value)).await {
            Ok(()) => {
                let mut guard = inner.lock().await;
                guard.persisted.insert(field, value.clone());
                // Clear the edit marker only if no newer edit landed while
                // the write was in flight.
                if field.get(&guard.session) == value {
                    if let Some(state) = guard.fields.get_mut(&field) {
                        state.editing = false;
                        state.pending = None;
                    }
                }
                debug!(?field, session_id = %session_id, "field persisted");
            }
            Err(e) => {
                // Left marked as editing; the next edit retries the write.
                warn!(?field, "failed to persist field edit: {e:#}");
            }
        }
    }

    /// Write any pending edits immediately, bypassing the debounce window.
    pub async fn flush(&self) {
        let dirty: Vec<EditableField> = {
            let mut inner = self.inner.lock().await;
            let mut dirty = Vec::new();
            for field in EditableField::ALL {
                if let Some(state) = inner.fields.get_mut(&field) {
                    if state.editing {
                        if let Some(task) = state.pending.take() {
                            task.abort();
                        }
                        dirty.push(field);
                    }
                }
            }
            dirty
        };

        for field in dirty {
            Self::write_field(&self.inner, &self.sessions, field).await;
        }
    }

    /// Subscribe to the realtime feed and reconcile remote changes.
    ///
    /// Session updates overwrite local state, except fields under active
    /// local edit. Transcript-chunk insertions are forwarded on the returned
    /// channel for the embedding app's reload path.
    pub async fn listen(
        &mut self,
        channel: Arc<dyn RealtimeChannel>,
    ) -> anyhow::Result<mpsc::Receiver<RemoteEvent>> {
        // A re-subscribe replaces the old listener outright.
        if let Some(previous) = self.listener.take() {
            previous.abort();
        }

        let session_id = { self.inner.lock().await.session.id.clone() };
        let mut stream = channel.subscribe(&session_id).await?;

        let (out_tx, out_rx) = mpsc::channel(100);
        let inner = Arc::clone(&self.inner);

        let listener = tokio::spawn(async move {
            info!(session_id = %session_id, "realtime listener started");

            while let Some(event) = stream.next().await {
                if event.session_id() != session_id {
                    continue;
                }

                match event {
                    RemoteEvent::SessionUpdated { mut fields, .. } => {
                        let mut guard = inner.lock().await;
                        for field in EditableField::ALL {
                            let under_edit =
                                guard.fields.get(&field).is_some_and(|s| s.editing);
                            if under_edit {
                                // Local edit wins until it persists.
                                field.clear_in(&mut fields);
                            } else if field.carried_by(&fields) {
                                let mut patched = guard.session.clone();
                                patched.apply(&fields);
                                guard.persisted.insert(field, field.get(&patched));
                            }
                        }
                        guard.session.apply(&fields);
                    }
                    chunk_event @ RemoteEvent::TranscriptChunkInserted { .. } => {
                        if out_tx.send(chunk_event).await.is_err() {
                            break;
                        }
                    }
                }
            }

            info!("realtime listener stopped");
        });

        self.listener = Some(listener);
        Ok(out_rx)
    }
}

impl Drop for SessionSyncManager {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
