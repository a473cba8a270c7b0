//! Workspace facade over the hierarchy store and the editing session.
//!
//! # Responsibility
//! - Expose the collaborator surface used by presentation layers.
//! - Keep the session consistent with create/delete/select/save operations.
//! - Detect open notes whose backing file vanished and drive recovery.
//!
//! # Invariants
//! - One `Workspace` owns exactly one store and one session; callers
//!   serialize access to it (see `service::editor`).
//! - Saving empty/whitespace-only content never touches the filesystem.
//! - In-memory notes are never saved, renamed, or moved.
//! - A save never resurrects a persisted note deleted behind our back.

use crate::model::node::{FontMeta, HierarchyNode, JournalRef, NoteRef, TrunkRef, NOTE_EXT};
use crate::naming::{codec, collision};
use crate::repo::hierarchy_repo::{read_note_file, HierarchyError, HierarchyStore};
use crate::repo::sidecar::{self, SidecarError};
use crate::session::state::{Session, SessionState};
use chrono::Local;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Slug prefix of implicitly materialized notes.
const UNSAVED_NOTE_PREFIX: &str = "note_";
/// Timestamp layout appended to [`UNSAVED_NOTE_PREFIX`].
const UNSAVED_NOTE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Result type used by workspace operations.
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Errors from workspace operations.
#[derive(Debug)]
pub enum WorkspaceError {
    /// Display name is blank or unusable as a slug.
    InvalidName(String),
    /// Create target already exists.
    AlreadyExists(PathBuf),
    /// Target is a reserved node.
    Protected(String),
    /// Target, source, or parent does not exist.
    NotFound(PathBuf),
    /// A journal with the same slug already exists at the move target.
    Conflict(PathBuf),
    /// Moving or renaming the primary content failed.
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// Writing the open note failed.
    SaveFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Operation targets the in-memory note.
    InMemory,
    /// Operation needs an open note but nothing is selected.
    NoOpenNote,
    /// Migration target lies inside the current root.
    NestedRoot(PathBuf),
    /// Other store-level failure (create/delete/read I/O).
    Store(HierarchyError),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid name: `{name}`"),
            Self::AlreadyExists(path) => write!(f, "already exists: {}", path.display()),
            Self::Protected(what) => write!(f, "`{what}` is protected"),
            Self::NotFound(path) => write!(f, "not found: {}", path.display()),
            Self::Conflict(path) => write!(f, "target already exists: {}", path.display()),
            Self::MoveFailed { from, to, source } => write!(
                f,
                "failed to move `{}` to `{}`: {source}",
                from.display(),
                to.display()
            ),
            Self::SaveFailed { path, source } => {
                write!(f, "failed to save `{}`: {source}", path.display())
            }
            Self::InMemory => write!(f, "note exists only in memory"),
            Self::NoOpenNote => write!(f, "no note is open"),
            Self::NestedRoot(path) => write!(
                f,
                "cannot migrate into `{}` because it is inside the current root",
                path.display()
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MoveFailed { source, .. } => Some(source),
            Self::SaveFailed { source, .. } => Some(source),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HierarchyError> for WorkspaceError {
    fn from(value: HierarchyError) -> Self {
        match value {
            HierarchyError::InvalidName(name) => Self::InvalidName(name),
            HierarchyError::AlreadyExists(path) => Self::AlreadyExists(path),
            HierarchyError::Protected(what) => Self::Protected(what),
            HierarchyError::NotFound(path) => Self::NotFound(path),
            other => Self::Store(other),
        }
    }
}

/// Why a save did not write anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSkip {
    /// Buffer is empty or whitespace-only.
    EmptyContent,
    /// Open note is in-memory only.
    InMemory,
    /// Open note's file disappeared; recovery happens on focus regain.
    BackingFileMissing,
}

/// Result of one save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was written.
    Skipped(SaveSkip),
    /// Buffer was written to the open note.
    Written(PathBuf),
    /// Buffer was materialized as a new note in the unsaved journal.
    Created(NoteRef),
}

/// Result of a selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A note is now open.
    Opened(NoteRef),
    /// Editor was cleared to `NoSelection`.
    Cleared,
    /// Caller declined to discard the in-memory note; nothing changed.
    Cancelled,
}

/// Result of the focus-regain staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Open note is fine or nothing persisted is open.
    Unchanged,
    /// Backing file vanished; buffer kept as an in-memory note.
    KeptInMemory,
    /// Backing file vanished; buffer discarded.
    Discarded,
}

/// Collaborator facade owning the store and the single session.
#[derive(Debug)]
pub struct Workspace {
    pub(crate) store: HierarchyStore,
    pub(crate) session: Session,
}

impl Workspace {
    /// Opens a workspace rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> WorkspaceResult<Self> {
        Ok(Self {
            store: HierarchyStore::open(root)?,
            session: Session::new(),
        })
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Lists the hierarchy freshly from disk.
    pub fn list_hierarchy(&self) -> WorkspaceResult<Vec<HierarchyNode>> {
        self.store.list_hierarchy().map_err(Into::into)
    }

    pub fn create_trunk(&self, name: &str) -> WorkspaceResult<TrunkRef> {
        self.store.create_trunk(name).map_err(Into::into)
    }

    pub fn create_journal(&self, trunk: &TrunkRef, name: &str) -> WorkspaceResult<JournalRef> {
        self.store.create_journal(trunk, name).map_err(Into::into)
    }

    pub fn create_note(&self, journal: &JournalRef, name: &str) -> WorkspaceResult<NoteRef> {
        self.store.create_note(journal, name).map_err(Into::into)
    }

    /// Deletes a trunk; clears the session if the open note lived inside.
    pub fn delete_trunk(&mut self, trunk: &TrunkRef) -> WorkspaceResult<()> {
        let path = self.store.trunk_path(trunk);
        self.store.delete_trunk(trunk)?;
        self.clear_if_open_under(&path);
        Ok(())
    }

    /// Deletes a journal; clears the session if the open note lived inside.
    pub fn delete_journal(&mut self, journal: &JournalRef) -> WorkspaceResult<()> {
        let path = self.store.journal_path(journal);
        self.store.delete_journal(journal)?;
        self.clear_if_open_under(&path);
        Ok(())
    }

    /// Deletes a note; clears the session if it was the open note.
    pub fn delete_note(&mut self, note: &NoteRef) -> WorkspaceResult<()> {
        let path = self.store.note_path(note);
        self.store.delete_note(note)?;
        self.clear_if_open_under(&path);
        Ok(())
    }

    pub fn load_note_content(&self, note: &NoteRef) -> WorkspaceResult<String> {
        self.store.load_note_content(note).map_err(Into::into)
    }

    /// Loads the font metadata of one note, defaulting on any failure.
    pub fn load_note_font(&self, note: &NoteRef) -> FontMeta {
        sidecar::load(&self.store.note_path(note))
    }

    /// Opens `note` after saving the current one.
    ///
    /// `confirm_discard` is asked only when the current note is in-memory;
    /// returning `false` cancels the selection. A missing target fails
    /// before the current note is touched.
    pub fn select_note<F>(
        &mut self,
        note: &NoteRef,
        confirm_discard: F,
    ) -> WorkspaceResult<SelectOutcome>
    where
        F: FnOnce() -> bool,
    {
        let path = self.store.note_path(note);
        if !path.is_file() {
            return Err(WorkspaceError::NotFound(path));
        }
        if !self.leave_current(confirm_discard)? {
            return Ok(SelectOutcome::Cancelled);
        }
        let content = read_note_file(&path)?;
        let font = sidecar::load(&path);
        self.session
            .open_persisted(path, codec::decode(&note.slug), content, font);
        debug!("event=note_select module=workspace status=ok note={}", note);
        Ok(SelectOutcome::Opened(note.clone()))
    }

    /// Selects a trunk or journal, which clears the editor.
    pub fn select_container<F>(&mut self, confirm_discard: F) -> WorkspaceResult<SelectOutcome>
    where
        F: FnOnce() -> bool,
    {
        if !self.leave_current(confirm_discard)? {
            return Ok(SelectOutcome::Cancelled);
        }
        self.session.clear();
        Ok(SelectOutcome::Cleared)
    }

    /// Replaces the live edit buffer.
    pub fn set_buffer(&mut self, content: impl Into<String>) {
        self.session.set_buffer(content);
    }

    /// Saves the live buffer.
    ///
    /// With no open file, non-empty content is materialized as
    /// `unsaved/notes/note_<YYYYMMDD_HHMMSS>`.
    pub fn save_current(&mut self) -> WorkspaceResult<SaveOutcome> {
        if self.session.is_in_memory() {
            return Ok(SaveOutcome::Skipped(SaveSkip::InMemory));
        }
        if self.session.buffer().trim().is_empty() {
            return Ok(SaveOutcome::Skipped(SaveSkip::EmptyContent));
        }
        let path = match self.session.state() {
            SessionState::OpenPersisted { path, .. } => path.clone(),
            SessionState::OpenInMemory { .. } => {
                return Ok(SaveOutcome::Skipped(SaveSkip::InMemory));
            }
            SessionState::NoSelection => {
                return self.materialize_unsaved().map(SaveOutcome::Created);
            }
        };
        if !path.is_file() {
            warn!(
                "event=note_save module=workspace status=skipped reason=backing_file_missing path={}",
                path.display()
            );
            return Ok(SaveOutcome::Skipped(SaveSkip::BackingFileMissing));
        }
        fs::write(&path, self.session.buffer()).map_err(|source| WorkspaceError::SaveFailed {
            path: path.clone(),
            source,
        })?;
        debug!(
            "event=note_save module=workspace status=ok bytes={}",
            self.session.buffer().len()
        );
        Ok(SaveOutcome::Written(path))
    }

    /// Updates the open note's font and persists it for file-backed notes.
    ///
    /// Sidecar failures are reported but leave the session updated.
    pub fn set_font(&mut self, font: FontMeta) -> Result<(), SidecarError> {
        self.session.set_font(font);
        match self.session.open_path() {
            Some(path) => sidecar::save(path, self.session.font()),
            None => Ok(()),
        }
    }

    /// Checks whether the open note's file vanished and drives recovery.
    ///
    /// `confirm_keep` decides between keeping the buffer in memory (`true`)
    /// and discarding it (`false`). It is only asked when the file is gone.
    pub fn on_focus_regained<F>(&mut self, confirm_keep: F) -> FocusOutcome
    where
        F: FnOnce() -> bool,
    {
        let missing = self
            .session
            .open_path()
            .is_some_and(|path| !path.is_file());
        if !missing {
            return FocusOutcome::Unchanged;
        }
        if confirm_keep() {
            self.session.keep_in_memory();
            info!("event=focus_recover module=workspace status=ok choice=keep_in_memory");
            FocusOutcome::KeptInMemory
        } else {
            self.session.clear();
            info!("event=focus_recover module=workspace status=ok choice=discard");
            FocusOutcome::Discarded
        }
    }

    /// Saves and closes the current note synchronously.
    pub fn close_current(&mut self) -> WorkspaceResult<SaveOutcome> {
        let outcome = self.save_current()?;
        self.session.clear();
        Ok(outcome)
    }

    /// Saves the current note before switching away from it.
    ///
    /// Returns `false` when the user refused to drop an in-memory note.
    fn leave_current<F>(&mut self, confirm_discard: F) -> WorkspaceResult<bool>
    where
        F: FnOnce() -> bool,
    {
        self.save_current()?;
        if self.session.is_in_memory() {
            if !confirm_discard() {
                return Ok(false);
            }
            self.session.clear();
        }
        Ok(true)
    }

    fn materialize_unsaved(&mut self) -> WorkspaceResult<NoteRef> {
        self.store.ensure_reserved()?;
        let dir = self.store.unsaved_notes_dir();
        let base = format!(
            "{UNSAVED_NOTE_PREFIX}{}",
            Local::now().format(UNSAVED_NOTE_TIME_FORMAT)
        );
        let resolved = collision::resolve(&dir, &base, NOTE_EXT);
        write_new_file(&resolved.path, self.session.buffer().as_bytes()).map_err(|source| {
            WorkspaceError::SaveFailed {
                path: resolved.path.clone(),
                source,
            }
        })?;
        let journal = JournalRef::unsaved();
        let note = NoteRef::new(journal.trunk, journal.journal, resolved.slug);
        self.session
            .bind_path(resolved.path, codec::decode(&note.slug));
        info!(
            "event=note_materialize module=workspace status=ok note={}",
            note
        );
        Ok(note)
    }

    fn clear_if_open_under(&mut self, path: &Path) {
        if self.session.is_open_under(path) {
            self.session.clear();
        }
    }
}

/// Writes a brand-new file, failing if the path is already taken.
pub(crate) fn write_new_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
