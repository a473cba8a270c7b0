//! Directory-backed Trunk > Journal > Note store.
//!
//! # Responsibility
//! - Map the three-level hierarchy onto `root/trunk/journal/.notes/*.txt`.
//! - Provide enumerate/create/delete primitives and path resolution.
//!
//! # Invariants
//! - Nothing is cached: every listing is derived from disk.
//! - Listing is deterministic: children sorted by slug at every level.
//! - The reserved `unsaved` trunk and its `notes` journal always exist and
//!   are never deleted.
//! - All paths resolve against the current root.

use crate::model::node::{
    HierarchyNode, JournalRef, NodeKind, NoteRef, TrunkRef, NOTES_DIR, NOTE_EXT, UNSAVED_JOURNAL,
    UNSAVED_TRUNK,
};
use crate::naming::{codec, collision};
use crate::repo::sidecar;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Result type used by hierarchy store operations.
pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Errors from hierarchy store operations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Display name is blank or encodes to an unusable slug.
    InvalidName(String),
    /// Target path is already occupied.
    AlreadyExists(PathBuf),
    /// Target is a reserved node and cannot be removed.
    Protected(String),
    /// Target or its parent does not exist.
    NotFound(PathBuf),
    /// Creating a directory or file failed.
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Removing a directory or file failed.
    DeleteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Reading or writing existing content failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid name: `{name}`"),
            Self::AlreadyExists(path) => write!(f, "already exists: {}", path.display()),
            Self::Protected(what) => write!(f, "`{what}` is protected and cannot be deleted"),
            Self::NotFound(path) => write!(f, "not found: {}", path.display()),
            Self::CreateFailed { path, source } => {
                write!(f, "failed to create `{}`: {source}", path.display())
            }
            Self::DeleteFailed { path, source } => {
                write!(f, "failed to delete `{}`: {source}", path.display())
            }
            Self::Io { path, source } => write!(f, "io error at `{}`: {source}", path.display()),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateFailed { source, .. } => Some(source),
            Self::DeleteFailed { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::InvalidName(_) => None,
            Self::AlreadyExists(_) => None,
            Self::Protected(_) => None,
            Self::NotFound(_) => None,
        }
    }
}

/// Filesystem hierarchy store bound to one root directory.
#[derive(Debug, Clone)]
pub struct HierarchyStore {
    root: PathBuf,
}

impl HierarchyStore {
    /// Binds a store to `root`, creating the root and reserved nodes.
    pub fn open(root: impl Into<PathBuf>) -> HierarchyResult<Self> {
        let store = Self { root: root.into() };
        store.ensure_reserved()?;
        info!(
            "event=store_open module=hierarchy status=ok root={}",
            store.root.display()
        );
        Ok(store)
    }

    /// Current root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebinds the store to another root, creating reserved nodes there.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) -> HierarchyResult<()> {
        self.root = root.into();
        self.ensure_reserved()
    }

    /// Creates the root and the reserved `unsaved/notes/.notes` tree if absent.
    pub fn ensure_reserved(&self) -> HierarchyResult<()> {
        let dir = self.unsaved_notes_dir();
        fs::create_dir_all(&dir).map_err(|source| HierarchyError::CreateFailed {
            path: dir.clone(),
            source,
        })
    }

    pub fn trunk_path(&self, trunk: &TrunkRef) -> PathBuf {
        self.root.join(&trunk.trunk)
    }

    pub fn journal_path(&self, journal: &JournalRef) -> PathBuf {
        self.root.join(&journal.trunk).join(&journal.journal)
    }

    /// Notes container of one journal.
    pub fn notes_dir(&self, journal: &JournalRef) -> PathBuf {
        self.journal_path(journal).join(NOTES_DIR)
    }

    pub fn note_path(&self, note: &NoteRef) -> PathBuf {
        self.notes_dir(&note.journal_ref()).join(note.file_name())
    }

    /// Notes container of the reserved `unsaved/notes` journal.
    pub fn unsaved_notes_dir(&self) -> PathBuf {
        self.notes_dir(&JournalRef::new(UNSAVED_TRUNK, UNSAVED_JOURNAL))
    }

    /// Maps an absolute note content path back to a reference.
    ///
    /// Returns `None` when the path is not `root/trunk/journal/.notes/x.txt`.
    pub fn note_ref_for_path(&self, path: &Path) -> Option<NoteRef> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts = relative
            .components()
            .map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        match parts.as_slice() {
            [trunk, journal, container, file] if *container == NOTES_DIR => {
                let slug = file.strip_suffix(NOTE_EXT)?;
                Some(NoteRef::new(*trunk, *journal, slug))
            }
            _ => None,
        }
    }

    pub fn trunk_exists(&self, trunk: &TrunkRef) -> bool {
        self.trunk_path(trunk).is_dir()
    }

    pub fn journal_exists(&self, journal: &JournalRef) -> bool {
        self.journal_path(journal).is_dir()
    }

    pub fn note_exists(&self, note: &NoteRef) -> bool {
        self.note_path(note).is_file()
    }

    /// Lists the full hierarchy, freshly read from disk.
    pub fn list_hierarchy(&self) -> HierarchyResult<Vec<HierarchyNode>> {
        let mut trunks = Vec::new();
        for (slug, trunk_path) in list_dirs(&self.root)? {
            let mut journals = Vec::new();
            for (journal_slug, journal_path) in list_dirs(&trunk_path)? {
                let notes = list_notes(&journal_path.join(NOTES_DIR))?;
                journals.push(HierarchyNode {
                    kind: NodeKind::Journal,
                    display_name: codec::decode(&journal_slug),
                    slug: journal_slug,
                    path: journal_path,
                    children: notes,
                });
            }
            trunks.push(HierarchyNode {
                kind: NodeKind::Trunk,
                display_name: codec::decode(&slug),
                slug,
                path: trunk_path,
                children: journals,
            });
        }
        Ok(trunks)
    }

    /// Creates one trunk directory from a display name.
    pub fn create_trunk(&self, name: &str) -> HierarchyResult<TrunkRef> {
        let trunk = TrunkRef::new(checked_slug(name)?);
        let path = self.trunk_path(&trunk);
        create_dir_new(&path)?;
        info!(
            "event=trunk_create module=hierarchy status=ok trunk={}",
            trunk
        );
        Ok(trunk)
    }

    /// Creates one journal (with its notes container) inside a trunk.
    pub fn create_journal(&self, trunk: &TrunkRef, name: &str) -> HierarchyResult<JournalRef> {
        let journal = JournalRef::new(trunk.trunk.clone(), checked_slug(name)?);
        self.require_dir(&self.trunk_path(trunk))?;
        let path = self.journal_path(&journal);
        create_dir_new(&path)?;
        let notes_dir = path.join(NOTES_DIR);
        fs::create_dir(&notes_dir).map_err(|source| HierarchyError::CreateFailed {
            path: notes_dir,
            source,
        })?;
        info!(
            "event=journal_create module=hierarchy status=ok journal={}",
            journal
        );
        Ok(journal)
    }

    /// Creates one empty note, disambiguating colliding slugs.
    pub fn create_note(&self, journal: &JournalRef, name: &str) -> HierarchyResult<NoteRef> {
        let base = checked_slug(name)?;
        self.require_dir(&self.journal_path(journal))?;
        let dir = self.ensure_notes_dir(journal)?;
        let resolved = collision::resolve(&dir, &base, NOTE_EXT);
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&resolved.path)
            .map_err(|source| HierarchyError::CreateFailed {
                path: resolved.path.clone(),
                source,
            })?;
        let note = NoteRef::new(
            journal.trunk.clone(),
            journal.journal.clone(),
            resolved.slug,
        );
        info!("event=note_create module=hierarchy status=ok note={}", note);
        Ok(note)
    }

    /// Creates the notes container of a journal if absent.
    pub fn ensure_notes_dir(&self, journal: &JournalRef) -> HierarchyResult<PathBuf> {
        let dir = self.notes_dir(journal);
        fs::create_dir_all(&dir).map_err(|source| HierarchyError::CreateFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Recursively deletes one trunk.
    pub fn delete_trunk(&self, trunk: &TrunkRef) -> HierarchyResult<()> {
        if trunk.is_reserved() {
            warn!(
                "event=trunk_delete module=hierarchy status=rejected reason=protected trunk={}",
                trunk
            );
            return Err(HierarchyError::Protected(trunk.to_string()));
        }
        remove_dir_tree(&self.trunk_path(trunk))?;
        info!("event=trunk_delete module=hierarchy status=ok trunk={}", trunk);
        Ok(())
    }

    /// Recursively deletes one journal and all of its notes.
    pub fn delete_journal(&self, journal: &JournalRef) -> HierarchyResult<()> {
        if journal.is_reserved() {
            warn!(
                "event=journal_delete module=hierarchy status=rejected reason=protected journal={}",
                journal
            );
            return Err(HierarchyError::Protected(journal.to_string()));
        }
        remove_dir_tree(&self.journal_path(journal))?;
        info!(
            "event=journal_delete module=hierarchy status=ok journal={}",
            journal
        );
        Ok(())
    }

    /// Deletes one note content file and its sidecar.
    pub fn delete_note(&self, note: &NoteRef) -> HierarchyResult<()> {
        let path = self.note_path(note);
        fs::remove_file(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => HierarchyError::NotFound(path.clone()),
            _ => HierarchyError::DeleteFailed {
                path: path.clone(),
                source,
            },
        })?;
        let _ = sidecar::remove(&path);
        info!("event=note_delete module=hierarchy status=ok note={}", note);
        Ok(())
    }

    /// Reads one note's UTF-8 content.
    pub fn load_note_content(&self, note: &NoteRef) -> HierarchyResult<String> {
        read_note_file(&self.note_path(note))
    }

    fn require_dir(&self, path: &Path) -> HierarchyResult<()> {
        if path.is_dir() {
            Ok(())
        } else {
            Err(HierarchyError::NotFound(path.to_path_buf()))
        }
    }
}

/// Reads a note content file, mapping a missing file to `NotFound`.
pub fn read_note_file(path: &Path) -> HierarchyResult<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => HierarchyError::NotFound(path.to_path_buf()),
        _ => HierarchyError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Encodes a display name and rejects slugs that cannot name a node.
pub fn checked_slug(name: &str) -> HierarchyResult<String> {
    let slug = codec::encode(name);
    let unusable = slug.is_empty()
        || slug.starts_with('.')
        || slug.contains(['/', '\\'])
        || slug.contains('\0');
    if unusable {
        return Err(HierarchyError::InvalidName(name.to_string()));
    }
    Ok(slug)
}

fn create_dir_new(path: &Path) -> HierarchyResult<()> {
    if path.symlink_metadata().is_ok() {
        return Err(HierarchyError::AlreadyExists(path.to_path_buf()));
    }
    fs::create_dir(path).map_err(|source| match source.kind() {
        ErrorKind::AlreadyExists => HierarchyError::AlreadyExists(path.to_path_buf()),
        ErrorKind::NotFound => HierarchyError::NotFound(
            path.parent().map(Path::to_path_buf).unwrap_or_default(),
        ),
        _ => HierarchyError::CreateFailed {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn remove_dir_tree(path: &Path) -> HierarchyResult<()> {
    if !path.is_dir() {
        return Err(HierarchyError::NotFound(path.to_path_buf()));
    }
    fs::remove_dir_all(path).map_err(|source| HierarchyError::DeleteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Lists visible child directories sorted by name.
fn list_dirs(dir: &Path) -> HierarchyResult<Vec<(String, PathBuf)>> {
    let mut dirs = read_entries(dir)?
        .into_iter()
        .filter(|(name, path)| !name.starts_with('.') && path.is_dir())
        .collect::<Vec<_>>();
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Lists note nodes inside one `.notes` container; absent container is empty.
fn list_notes(notes_dir: &Path) -> HierarchyResult<Vec<HierarchyNode>> {
    if !notes_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut notes = read_entries(notes_dir)?
        .into_iter()
        .filter(|(_, path)| path.is_file())
        .filter_map(|(name, path)| {
            let slug = name.strip_suffix(NOTE_EXT)?.to_string();
            Some(HierarchyNode {
                kind: NodeKind::Note,
                display_name: codec::decode(&slug),
                slug,
                path,
                children: Vec::new(),
            })
        })
        .collect::<Vec<_>>();
    notes.sort_by(|a, b| a.slug.cmp(&b.slug));
    Ok(notes)
}

fn read_entries(dir: &Path) -> HierarchyResult<Vec<(String, PathBuf)>> {
    let io_err = |source| HierarchyError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        match entry.file_name().into_string() {
            Ok(name) => entries.push((name, entry.path())),
            Err(raw) => debug!(
                "event=list_skip module=hierarchy status=skipped reason=non_utf8 name={:?}",
                raw
            ),
        }
    }
    Ok(entries)
}
