//! Core storage and navigation engine for Journa.
//! Keeps the Trunk > Journal > Note hierarchy consistent with the directory
//! tree on disk, which is the single source of truth.

pub mod logging;
pub mod model;
pub mod naming;
pub mod repo;
pub mod service;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::node::{
    FontMeta, HierarchyNode, JournalRef, NodeKind, NoteRef, TrunkRef, UNSAVED_JOURNAL,
    UNSAVED_TRUNK,
};
pub use naming::codec::{decode, encode};
pub use repo::hierarchy_repo::{HierarchyError, HierarchyResult, HierarchyStore};
pub use repo::sidecar::SidecarError;
pub use service::editor::{Editor, SharedWorkspace};
pub use service::move_service::{NoteMoveOutcome, RelocationReport};
pub use service::workspace::{
    FocusOutcome, SaveOutcome, SaveSkip, SelectOutcome, Workspace, WorkspaceError,
    WorkspaceResult,
};
pub use session::autosave::{AutosaveScheduler, AUTOSAVE_DELAY};
pub use session::state::{Session, SessionState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
