//! Hierarchy node model.
//!
//! # Responsibility
//! - Define the Trunk/Journal/Note read model projected from disk.
//! - Define slug-addressed references used by store and service calls.
//!
//! # Invariants
//! - Every node carries an explicit `NodeKind`; kind is never inferred from
//!   nesting depth.
//! - References are plain values resolved against the store root at call
//!   time, so they stay valid across root relocation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Slug of the reserved trunk that receives implicitly created notes.
pub const UNSAVED_TRUNK: &str = "unsaved";
/// Slug of the reserved journal inside [`UNSAVED_TRUNK`].
pub const UNSAVED_JOURNAL: &str = "notes";
/// Fixed container folder holding a journal's note files.
pub const NOTES_DIR: &str = ".notes";
/// Note content file extension.
pub const NOTE_EXT: &str = ".txt";

/// Hierarchy level of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Top-level folder.
    Trunk,
    /// Folder inside a trunk.
    Journal,
    /// Text file inside a journal's notes container.
    Note,
}

impl NodeKind {
    /// Stable lowercase label used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trunk => "trunk",
            Self::Journal => "journal",
            Self::Note => "note",
        }
    }
}

/// Read-only projection of one hierarchy node.
///
/// Rebuilt from disk on every listing; never treated as authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    /// Node level.
    pub kind: NodeKind,
    /// On-disk name. For notes this excludes the `.txt` extension.
    pub slug: String,
    /// Decoded user-facing label.
    pub display_name: String,
    /// Absolute path of the directory (trunk/journal) or content file (note).
    pub path: PathBuf,
    /// Child nodes sorted by slug. Always empty for notes.
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Finds a direct child by slug.
    pub fn child(&self, slug: &str) -> Option<&HierarchyNode> {
        self.children.iter().find(|child| child.slug == slug)
    }
}

/// Reference to one trunk by slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrunkRef {
    pub trunk: String,
}

impl TrunkRef {
    pub fn new(trunk: impl Into<String>) -> Self {
        Self {
            trunk: trunk.into(),
        }
    }

    /// Returns whether this is the reserved `unsaved` trunk.
    pub fn is_reserved(&self) -> bool {
        self.trunk == UNSAVED_TRUNK
    }
}

/// Reference to one journal by trunk and journal slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JournalRef {
    pub trunk: String,
    pub journal: String,
}

impl JournalRef {
    pub fn new(trunk: impl Into<String>, journal: impl Into<String>) -> Self {
        Self {
            trunk: trunk.into(),
            journal: journal.into(),
        }
    }

    /// The reserved journal receiving implicitly created notes.
    pub fn unsaved() -> Self {
        Self::new(UNSAVED_TRUNK, UNSAVED_JOURNAL)
    }

    /// Returns whether this is the reserved `unsaved/notes` journal.
    pub fn is_reserved(&self) -> bool {
        self.trunk == UNSAVED_TRUNK && self.journal == UNSAVED_JOURNAL
    }

    pub fn trunk_ref(&self) -> TrunkRef {
        TrunkRef::new(self.trunk.clone())
    }
}

/// Reference to one note by trunk, journal, and note slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteRef {
    pub trunk: String,
    pub journal: String,
    /// Note slug without extension, including any numeric disambiguator.
    pub slug: String,
}

impl NoteRef {
    pub fn new(
        trunk: impl Into<String>,
        journal: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            trunk: trunk.into(),
            journal: journal.into(),
            slug: slug.into(),
        }
    }

    pub fn journal_ref(&self) -> JournalRef {
        JournalRef::new(self.trunk.clone(), self.journal.clone())
    }

    /// Content file name, `<slug>.txt`.
    pub fn file_name(&self) -> String {
        format!("{}{NOTE_EXT}", self.slug)
    }
}

impl Display for TrunkRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.trunk)
    }
}

impl Display for JournalRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.trunk, self.journal)
    }
}

impl Display for NoteRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.trunk, self.journal, self.slug)
    }
}

/// Per-note font metadata persisted in the sidecar file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontMeta {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

impl Default for FontMeta {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    12
}
