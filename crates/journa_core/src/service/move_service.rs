//! Note/journal relocation, note rename, and root relocation.
//!
//! # Responsibility
//! - Move notes between journals and journals between trunks.
//! - Rename notes with collision resolution.
//! - Relocate the workspace root, optionally migrating every trunk.
//! - Carry sidecars along and keep the open session pointed at the moved
//!   file.
//!
//! # Invariants
//! - Moves never overwrite: colliding note names are disambiguated,
//!   colliding journal names fail with `Conflict`.
//! - The content file is authoritative; a sidecar that fails to follow is
//!   left behind at the source and only logged.
//! - A journal holding the open note is saved and closed before it moves.

use crate::model::node::{JournalRef, NoteRef, TrunkRef, NOTE_EXT};
use crate::naming::{codec, collision};
use crate::repo::fs_util::move_path;
use crate::repo::hierarchy_repo::{checked_slug, HierarchyError};
use crate::repo::sidecar;
use crate::service::workspace::{write_new_file, Workspace, WorkspaceError, WorkspaceResult};
use crate::session::state::SessionState;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of moving or renaming one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMoveOutcome {
    /// Reference to the note at its final location.
    pub note: NoteRef,
    /// Whether a numeric suffix was appended to avoid a collision.
    pub disambiguated: bool,
}

/// Per-trunk report of a root relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationReport {
    /// Root before relocation.
    pub old_root: PathBuf,
    /// Root after relocation.
    pub new_root: PathBuf,
    /// Trunk slugs moved to the new root.
    pub moved: Vec<String>,
    /// Trunk slugs skipped because the new root already had them.
    pub skipped: Vec<String>,
    /// Trunk slugs whose move failed, with the error message.
    pub failed: Vec<(String, String)>,
    /// Whether the open note's file is missing after relocation. The
    /// caller resolves this through `Workspace::on_focus_regained`.
    pub open_note_missing: bool,
}

impl Workspace {
    /// Moves one note into another journal.
    ///
    /// Same-journal moves are a no-op. Name collisions at the target get a
    /// numeric suffix instead of overwriting.
    pub fn move_note(
        &mut self,
        note: &NoteRef,
        target: &JournalRef,
    ) -> WorkspaceResult<NoteMoveOutcome> {
        self.reject_in_memory(&self.store.note_path(note))?;
        if note.journal_ref() == *target {
            return Ok(NoteMoveOutcome {
                note: note.clone(),
                disambiguated: false,
            });
        }
        let source = self.store.note_path(note);
        if !source.is_file() {
            return Err(WorkspaceError::NotFound(source));
        }
        if !self.store.journal_exists(target) {
            return Err(WorkspaceError::NotFound(self.store.journal_path(target)));
        }
        let dest_dir = self.store.ensure_notes_dir(target)?;
        let resolved = collision::resolve(&dest_dir, &note.slug, NOTE_EXT);

        move_path(&source, &resolved.path).map_err(|err| {
            warn!("event=note_move module=move status=error note={} error={err}", note);
            WorkspaceError::MoveFailed {
                from: source.clone(),
                to: resolved.path.clone(),
                source: err,
            }
        })?;
        let _ = sidecar::relocate(&source, &resolved.path);

        let disambiguated = resolved.was_disambiguated(&note.slug);
        let moved = NoteRef::new(target.trunk.clone(), target.journal.clone(), resolved.slug);
        self.redirect_open_note(&source, resolved.path, &moved);
        info!(
            "event=note_move module=move status=ok from={} to={} disambiguated={}",
            note, moved, disambiguated
        );
        Ok(NoteMoveOutcome {
            note: moved,
            disambiguated,
        })
    }

    /// Moves one journal (with all of its notes) into another trunk.
    ///
    /// Fails with `Conflict` when the target trunk already has a journal with
    /// the same slug. If the open note lives inside, it is saved and closed
    /// first.
    pub fn move_journal(
        &mut self,
        journal: &JournalRef,
        target: &TrunkRef,
    ) -> WorkspaceResult<JournalRef> {
        if journal.trunk == target.trunk {
            return Ok(journal.clone());
        }
        if journal.is_reserved() {
            return Err(HierarchyError::Protected(journal.to_string()).into());
        }
        let source = self.store.journal_path(journal);
        if !source.is_dir() {
            return Err(WorkspaceError::NotFound(source));
        }
        if !self.store.trunk_exists(target) {
            return Err(WorkspaceError::NotFound(self.store.trunk_path(target)));
        }
        let moved = JournalRef::new(target.trunk.clone(), journal.journal.clone());
        let dest = self.store.journal_path(&moved);
        if dest.symlink_metadata().is_ok() {
            warn!(
                "event=journal_move module=move status=rejected reason=conflict journal={} target={}",
                journal, target
            );
            return Err(WorkspaceError::Conflict(dest));
        }

        if self.session.is_open_under(&source) {
            self.close_current()?;
        }

        move_path(&source, &dest).map_err(|err| {
            warn!(
                "event=journal_move module=move status=error journal={} error={err}",
                journal
            );
            WorkspaceError::MoveFailed {
                from: source.clone(),
                to: dest.clone(),
                source: err,
            }
        })?;
        info!(
            "event=journal_move module=move status=ok from={} to={}",
            journal, moved
        );
        Ok(moved)
    }

    /// Renames one note by display name.
    ///
    /// The new file is written before the old one is removed. When the note
    /// is open, the live buffer is what gets written; otherwise the stored
    /// bytes are carried over unchanged.
    pub fn rename_note(
        &mut self,
        note: &NoteRef,
        new_display_name: &str,
    ) -> WorkspaceResult<NoteMoveOutcome> {
        let base = checked_slug(new_display_name)?;
        let source = self.store.note_path(note);
        self.reject_in_memory(&source)?;
        if !source.is_file() {
            return Err(WorkspaceError::NotFound(source));
        }
        if base == note.slug {
            return Ok(NoteMoveOutcome {
                note: note.clone(),
                disambiguated: false,
            });
        }
        let dir = self.store.notes_dir(&note.journal_ref());
        let resolved = collision::resolve(&dir, &base, NOTE_EXT);

        let bytes = if self.session.open_path() == Some(source.as_path()) {
            self.session.buffer().as_bytes().to_vec()
        } else {
            fs::read(&source).map_err(|err| rename_failed(&source, &resolved.path, err))?
        };
        write_new_file(&resolved.path, &bytes)
            .map_err(|err| rename_failed(&source, &resolved.path, err))?;
        if let Err(err) = fs::remove_file(&source) {
            let _ = fs::remove_file(&resolved.path);
            return Err(rename_failed(&source, &resolved.path, err));
        }
        let _ = sidecar::relocate(&source, &resolved.path);

        let disambiguated = resolved.was_disambiguated(&base);
        let renamed = NoteRef::new(note.trunk.clone(), note.journal.clone(), resolved.slug);
        self.redirect_open_note(&source, resolved.path, &renamed);
        info!(
            "event=note_rename module=move status=ok from={} to={} disambiguated={}",
            note, renamed, disambiguated
        );
        Ok(NoteMoveOutcome {
            note: renamed,
            disambiguated,
        })
    }

    /// Renames the currently open note.
    pub fn rename_current(&mut self, new_display_name: &str) -> WorkspaceResult<NoteMoveOutcome> {
        let note = match self.session.state() {
            SessionState::NoSelection => return Err(WorkspaceError::NoOpenNote),
            SessionState::OpenInMemory { .. } => return Err(WorkspaceError::InMemory),
            SessionState::OpenPersisted { path, .. } => self
                .store
                .note_ref_for_path(path)
                .ok_or_else(|| WorkspaceError::NotFound(path.clone()))?,
        };
        self.rename_note(&note, new_display_name)
    }

    /// Switches the workspace root, optionally migrating every trunk.
    ///
    /// Trunks already present at the new root are skipped and reported.
    /// Migrating into a directory below the current root fails with
    /// `NestedRoot` before anything is touched.
    /// Persisting the new root is the caller's job.
    pub fn relocate_root(
        &mut self,
        new_root: impl Into<PathBuf>,
        migrate: bool,
    ) -> WorkspaceResult<RelocationReport> {
        let new_root = new_root.into();
        let old_root = self.store.root().to_path_buf();
        let mut report = RelocationReport {
            old_root: old_root.clone(),
            new_root: new_root.clone(),
            ..RelocationReport::default()
        };
        if new_root == old_root {
            return Ok(report);
        }
        if migrate && new_root.starts_with(&old_root) {
            warn!(
                "event=root_relocate module=move status=rejected reason=nested_root new_root={}",
                new_root.display()
            );
            return Err(WorkspaceError::NestedRoot(new_root));
        }
        fs::create_dir_all(&new_root).map_err(|source| HierarchyError::CreateFailed {
            path: new_root.clone(),
            source,
        })?;

        if migrate {
            let trunks = self.store.list_hierarchy()?;
            for trunk in trunks {
                let dest = new_root.join(&trunk.slug);
                if dest.symlink_metadata().is_ok() {
                    warn!(
                        "event=root_migrate module=move status=skipped reason=conflict trunk={}",
                        trunk.slug
                    );
                    report.skipped.push(trunk.slug);
                    continue;
                }
                match move_path(&trunk.path, &dest) {
                    Ok(()) => report.moved.push(trunk.slug),
                    Err(err) => {
                        warn!(
                            "event=root_migrate module=move status=error trunk={} error={err}",
                            trunk.slug
                        );
                        report.failed.push((trunk.slug, err.to_string()));
                    }
                }
            }
        }

        self.store.set_root(new_root.clone())?;
        if migrate {
            self.rebase_open_note(&old_root, &new_root);
        }
        report.open_note_missing = self
            .session
            .open_path()
            .is_some_and(|path| !path.is_file());
        info!(
            "event=root_relocate module=move status=ok migrate={} moved={} skipped={} failed={} open_note_missing={}",
            migrate,
            report.moved.len(),
            report.skipped.len(),
            report.failed.len(),
            report.open_note_missing
        );
        Ok(report)
    }

    fn reject_in_memory(&self, source: &Path) -> WorkspaceResult<()> {
        if self.session.in_memory_origin() == Some(source) {
            return Err(WorkspaceError::InMemory);
        }
        Ok(())
    }

    fn redirect_open_note(&mut self, source: &Path, dest: PathBuf, note: &NoteRef) {
        if self.session.open_path() == Some(source) {
            self.session.redirect(dest, codec::decode(&note.slug));
        }
    }

    fn rebase_open_note(&mut self, old_root: &Path, new_root: &Path) {
        let rebased = self
            .session
            .open_path()
            .and_then(|path| path.strip_prefix(old_root).ok())
            .map(|relative| new_root.join(relative));
        if let Some(path) = rebased {
            let label = self.session.label().to_string();
            self.session.redirect(path, label);
        }
    }
}

fn rename_failed(from: &Path, to: &Path, source: std::io::Error) -> WorkspaceError {
    warn!(
        "event=note_rename module=move status=error from={} error={source}",
        from.display()
    );
    WorkspaceError::MoveFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}
