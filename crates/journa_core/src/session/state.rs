//! Open-note session state.
//!
//! # Responsibility
//! - Track which note is open, whether it is backed by a file, the live
//!   edit buffer, and the note's font metadata.
//!
//! # Invariants
//! - `OpenInMemory` is never written; its `origin` only identifies the
//!   note it came from.
//! - `NoSelection` always uses the default font.

use crate::model::node::FontMeta;
use std::path::{Path, PathBuf};

/// Header label shown when nothing is open.
pub const UNTITLED_LABEL: &str = "Untitled";
/// Label prefix marking a note kept only in memory.
pub const IN_MEMORY_PREFIX: &str = "In-Memory: ";

/// Open-note status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No note is open. Typed content may still be buffered.
    NoSelection,
    /// An on-disk note is open.
    OpenPersisted { path: PathBuf, label: String },
    /// The note's file is gone; its content lives only in the buffer.
    /// `origin` is where the file used to be; nothing is written there.
    OpenInMemory { label: String, origin: PathBuf },
}

/// Single active editing session.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    buffer: String,
    font: FontMeta,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::NoSelection,
            buffer: String::new(),
            font: FontMeta::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Live edit buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn font(&self) -> &FontMeta {
        &self.font
    }

    /// Path of the open persisted note, if any.
    pub fn open_path(&self) -> Option<&Path> {
        match &self.state {
            SessionState::OpenPersisted { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.state, SessionState::OpenInMemory { .. })
    }

    /// Former path of the in-memory note, if one is open.
    pub fn in_memory_origin(&self) -> Option<&Path> {
        match &self.state {
            SessionState::OpenInMemory { origin, .. } => Some(origin),
            _ => None,
        }
    }

    /// Header label for the current state.
    pub fn label(&self) -> &str {
        match &self.state {
            SessionState::NoSelection => UNTITLED_LABEL,
            SessionState::OpenPersisted { label, .. } => label,
            SessionState::OpenInMemory { label, .. } => label,
        }
    }

    /// Replaces the live buffer with freshly typed content.
    pub fn set_buffer(&mut self, content: impl Into<String>) {
        self.buffer = content.into();
    }

    pub fn set_font(&mut self, font: FontMeta) {
        self.font = font;
    }

    /// Opens a persisted note with its loaded content and font.
    pub fn open_persisted(
        &mut self,
        path: PathBuf,
        label: impl Into<String>,
        content: String,
        font: FontMeta,
    ) {
        self.state = SessionState::OpenPersisted {
            path,
            label: label.into(),
        };
        self.buffer = content;
        self.font = font;
    }

    /// Binds buffered content to a newly materialized file.
    pub fn bind_path(&mut self, path: PathBuf, label: impl Into<String>) {
        self.state = SessionState::OpenPersisted {
            path,
            label: label.into(),
        };
    }

    /// Points the open note at a new path after a move or rename.
    ///
    /// Does nothing unless a persisted note is open.
    pub fn redirect(&mut self, path: PathBuf, label: impl Into<String>) {
        if let SessionState::OpenPersisted {
            path: current,
            label: current_label,
        } = &mut self.state
        {
            *current = path;
            *current_label = label.into();
        }
    }

    /// Converts the open persisted note into an in-memory note.
    pub fn keep_in_memory(&mut self) {
        if let SessionState::OpenPersisted { path, label } = &self.state {
            self.state = SessionState::OpenInMemory {
                label: format!("{IN_MEMORY_PREFIX}{label}"),
                origin: path.clone(),
            };
        }
    }

    /// Clears the editor back to `NoSelection` with default font.
    pub fn clear(&mut self) {
        self.state = SessionState::NoSelection;
        self.buffer.clear();
        self.font = FontMeta::default();
    }

    /// Returns whether the open persisted note lives under `dir`.
    pub fn is_open_under(&self, dir: &Path) -> bool {
        self.open_path().is_some_and(|path| path.starts_with(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, SessionState, UNTITLED_LABEL};
    use crate::model::node::FontMeta;
    use std::path::{Path, PathBuf};

    fn opened() -> Session {
        let mut session = Session::new();
        session.open_persisted(
            PathBuf::from("/r/work/daily/.notes/monday.txt"),
            "Monday",
            "hello".to_string(),
            FontMeta {
                font_family: "Verdana".to_string(),
                font_size: 14,
            },
        );
        session
    }

    #[test]
    fn new_session_has_no_selection() {
        let session = Session::new();
        assert_eq!(session.state(), &SessionState::NoSelection);
        assert_eq!(session.label(), UNTITLED_LABEL);
        assert!(session.open_path().is_none());
    }

    #[test]
    fn keep_in_memory_stops_persisting_and_prefixes_label() {
        let mut session = opened();
        session.keep_in_memory();
        assert!(session.is_in_memory());
        assert_eq!(session.label(), "In-Memory: Monday");
        assert_eq!(session.buffer(), "hello");
        assert!(session.open_path().is_none());
        assert_eq!(
            session.in_memory_origin(),
            Some(Path::new("/r/work/daily/.notes/monday.txt"))
        );
        assert!(!session.is_open_under(Path::new("/r/work")));
    }

    #[test]
    fn redirect_only_touches_persisted_notes() {
        let mut session = opened();
        session.redirect(PathBuf::from("/r/x/y/.notes/monday_2.txt"), "Monday (2)");
        assert_eq!(
            session.open_path(),
            Some(Path::new("/r/x/y/.notes/monday_2.txt"))
        );
        assert_eq!(session.label(), "Monday (2)");

        let mut empty = Session::new();
        empty.redirect(PathBuf::from("/r/a.txt"), "A");
        assert_eq!(empty.state(), &SessionState::NoSelection);
    }

    #[test]
    fn clear_resets_buffer_and_font() {
        let mut session = opened();
        session.clear();
        assert_eq!(session.buffer(), "");
        assert_eq!(session.font(), &FontMeta::default());
        assert!(!session.is_open_under(Path::new("/r")));
    }

    #[test]
    fn is_open_under_matches_ancestors() {
        let session = opened();
        assert!(session.is_open_under(Path::new("/r/work/daily")));
        assert!(session.is_open_under(Path::new("/r/work")));
        assert!(!session.is_open_under(Path::new("/r/work/weekly")));
    }
}
