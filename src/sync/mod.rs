//! Session field autosave and realtime reconciliation
//!
//! `SessionSyncManager` keeps a local view of one session in step with the
//! session CRUD API and the realtime change feed. Scalar edits (the patient
//! display name, the selected template) are debounced by an idle window and
//! skipped outright when the value already matches what was last persisted.
//! Remote updates overwrite local state, except for a field the user is
//! actively editing: there the local edit wins until it is persisted itself.

mod manager;

pub use manager::{EditableField, SessionSyncManager};
