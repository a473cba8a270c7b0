//! Per-note font metadata sidecar files.
//!
//! # Responsibility
//! - Persist `FontMeta` next to a note's content file as JSON.
//! - Load metadata with local recovery to defaults.
//!
//! # Invariants
//! - Sidecar path is always `<note path>.meta`.
//! - Sidecar I/O never fails a caller: `load` recovers to defaults and
//!   `save`/`relocate`/`remove` report failures as values.

use crate::model::node::FontMeta;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Fixed suffix appended to the note content path.
pub const SIDECAR_SUFFIX: &str = ".meta";

/// Best-effort sidecar failure report.
#[derive(Debug)]
pub enum SidecarError {
    /// Filesystem failure while reading, writing, or moving.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Sidecar content is not a valid metadata record.
    MalformedMetadata {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for SidecarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "sidecar io failed at `{}`: {source}", path.display())
            }
            Self::MalformedMetadata { path, source } => {
                write!(f, "malformed metadata at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for SidecarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::MalformedMetadata { source, .. } => Some(source),
        }
    }
}

/// Returns the sidecar path for one note content path.
pub fn sidecar_path(note_path: &Path) -> PathBuf {
    let mut raw = note_path.as_os_str().to_owned();
    raw.push(SIDECAR_SUFFIX);
    PathBuf::from(raw)
}

/// Loads font metadata, recovering to defaults on any failure.
pub fn load(note_path: &Path) -> FontMeta {
    match try_load(note_path) {
        Ok(Some(meta)) => meta,
        Ok(None) => FontMeta::default(),
        Err(err) => {
            warn!("event=sidecar_load module=sidecar status=recovered error={err}");
            FontMeta::default()
        }
    }
}

/// Loads font metadata, surfacing failures instead of recovering.
///
/// Returns `Ok(None)` when no sidecar exists.
pub fn try_load(note_path: &Path) -> Result<Option<FontMeta>, SidecarError> {
    let path = sidecar_path(note_path);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(SidecarError::Io { path, source }),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| SidecarError::MalformedMetadata { path, source })
}

/// Writes font metadata. Failure is logged and returned, never fatal.
pub fn save(note_path: &Path, meta: &FontMeta) -> Result<(), SidecarError> {
    let path = sidecar_path(note_path);
    let body = serde_json::to_string(meta).map_err(|source| SidecarError::MalformedMetadata {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, body).map_err(|source| {
        let err = SidecarError::Io {
            path: path.clone(),
            source,
        };
        warn!("event=sidecar_save module=sidecar status=error error={err}");
        err
    })?;
    debug!(
        "event=sidecar_save module=sidecar status=ok family={} size={}",
        meta.font_family, meta.font_size
    );
    Ok(())
}

/// Moves the sidecar of `from` to sit next to `to`.
///
/// A missing source sidecar is a successful no-op. On failure the sidecar
/// stays orphaned at the source and the note falls back to defaults.
pub fn relocate(from: &Path, to: &Path) -> Result<(), SidecarError> {
    let source_path = sidecar_path(from);
    if !source_path.exists() {
        return Ok(());
    }
    let target_path = sidecar_path(to);
    crate::repo::fs_util::move_path(&source_path, &target_path).map_err(|source| {
        let err = SidecarError::Io {
            path: source_path.clone(),
            source,
        };
        warn!("event=sidecar_relocate module=sidecar status=error error={err}");
        err
    })
}

/// Removes the sidecar of one note if present.
pub fn remove(note_path: &Path) -> Result<(), SidecarError> {
    let path = sidecar_path(note_path);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => {
            let err = SidecarError::Io { path, source };
            warn!("event=sidecar_remove module=sidecar status=error error={err}");
            Err(err)
        }
    }
}
