use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::state::WorkflowState;

/// Delivers workflow-state updates for the current orchestrator only.
///
/// A call site keeps one observer across orchestrator instances. Creating a
/// new orchestrator attaches its id here, which silently supersedes the
/// previous one: updates published under a stale id are dropped rather than
/// delivered. In-flight work is not aborted, only muted.
pub struct StateObserver {
    current: Mutex<Option<Uuid>>,
    callback: Box<dyn Fn(&WorkflowState) + Send + Sync>,
}

impl StateObserver {
    pub fn new(callback: impl Fn(&WorkflowState) + Send + Sync + 'static) -> Self {
        Self {
            current: Mutex::new(None),
            callback: Box::new(callback),
        }
    }

    /// Make `run_id` the current instance; all other ids go quiet.
    pub fn attach(&self, run_id: Uuid) {
        let mut current = self.current.lock().unwrap();
        if let Some(previous) = current.replace(run_id) {
            debug!(%previous, %run_id, "orchestrator superseded");
        }
    }

    /// Stop delivering updates entirely (e.g. the session view closed).
    pub fn detach(&self) {
        *self.current.lock().unwrap() = None;
    }

    pub(crate) fn publish(&self, run_id: Uuid, state: &WorkflowState) {
        let is_current = *self.current.lock().unwrap() == Some(run_id);
        if is_current {
            (self.callback)(state);
        }
    }
}
