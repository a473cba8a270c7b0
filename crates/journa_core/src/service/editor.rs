//! Debounced editing front-end over a shared workspace.
//!
//! # Responsibility
//! - Feed keystroke-level edits into the session buffer.
//! - Drive trailing-edge autosave through `AutosaveScheduler`.
//! - Flush pending edits before selection changes.
//!
//! # Invariants
//! - All workspace mutation, including timer-fired saves, goes through one
//!   mutex, so two saves of the same note never overlap.
//! - Every edit cancels and reschedules the single pending save.
//! - `edit` must be called from within a tokio runtime.

use crate::model::node::NoteRef;
use crate::service::workspace::{SaveOutcome, SelectOutcome, Workspace, WorkspaceResult};
use crate::session::autosave::AutosaveScheduler;
use log::{debug, error};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Workspace handle shared between the editor and its autosave task.
pub type SharedWorkspace = Arc<Mutex<Workspace>>;

/// Editing session driver with debounced autosave.
#[derive(Debug)]
pub struct Editor {
    workspace: SharedWorkspace,
    autosave: AutosaveScheduler,
}

impl Editor {
    /// Wraps a workspace with an autosave delay.
    pub fn new(workspace: Workspace, delay: Duration) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(workspace)),
            autosave: AutosaveScheduler::new(delay),
        }
    }

    /// Shared handle to the underlying workspace.
    pub fn workspace(&self) -> SharedWorkspace {
        Arc::clone(&self.workspace)
    }

    /// Locks the workspace for direct collaborator calls.
    pub fn lock(&self) -> MutexGuard<'_, Workspace> {
        lock_workspace(&self.workspace)
    }

    /// Records typed content and restarts the autosave window.
    pub fn edit(&mut self, content: impl Into<String>) {
        self.lock().set_buffer(content);
        let workspace = Arc::clone(&self.workspace);
        self.autosave.reschedule(move || {
            let mut workspace = lock_workspace(&workspace);
            match workspace.save_current() {
                Ok(outcome) => debug!(
                    "event=autosave_fire module=editor status=ok outcome={:?}",
                    outcome
                ),
                Err(err) => error!("event=autosave_fire module=editor status=error error={err}"),
            }
        });
    }

    /// Returns whether an autosave is waiting for its quiet window.
    pub fn is_save_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    /// Cancels any pending autosave and saves immediately.
    pub fn flush(&mut self) -> WorkspaceResult<SaveOutcome> {
        self.autosave.cancel();
        self.lock().save_current()
    }

    /// Switches to another note, saving pending edits first.
    pub fn select_note<F>(
        &mut self,
        note: &NoteRef,
        confirm_discard: F,
    ) -> WorkspaceResult<SelectOutcome>
    where
        F: FnOnce() -> bool,
    {
        self.autosave.cancel();
        self.lock().select_note(note, confirm_discard)
    }

    /// Flushes pending edits and ends the editing session.
    pub fn close(mut self) -> WorkspaceResult<SaveOutcome> {
        self.flush()
    }
}

fn lock_workspace(workspace: &Mutex<Workspace>) -> MutexGuard<'_, Workspace> {
    // A panicked save leaves the workspace usable; disk stays the truth.
    workspace.lock().unwrap_or_else(PoisonError::into_inner)
}
