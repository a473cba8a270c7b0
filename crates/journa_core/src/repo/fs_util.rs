//! Filesystem move helpers.
//!
//! # Invariants
//! - `move_path` never overwrites an existing target.
//! - Only cross-device renames fall back to copy + remove; every other
//!   rename error is returned with the source untouched.
//! - A failed fallback leaves no copy at the target.

use log::warn;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

/// Moves a file or directory tree from `from` to `to`.
pub fn move_path(from: &Path, to: &Path) -> std::io::Result<()> {
    if to.symlink_metadata().is_ok() {
        return Err(Error::new(
            ErrorKind::AlreadyExists,
            format!("move target `{}` already exists", to.display()),
        ));
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            copy_recursive(from, to).inspect_err(|_| {
                let _ = remove_any(to);
            })?;
            discard_source(from).inspect_err(|_| {
                let _ = remove_any(to);
            })
        }
        Err(err) => Err(err),
    }
}

/// Drops the source of a completed cross-device copy.
///
/// Directories are first renamed aside on their own filesystem, so a failure
/// either keeps the source whole or happens after it is already out of the
/// hierarchy.
fn discard_source(from: &Path) -> std::io::Result<()> {
    if !from.symlink_metadata()?.is_dir() {
        return fs::remove_file(from);
    }
    let staged = staging_path(from);
    fs::rename(from, &staged)?;
    if let Err(err) = fs::remove_dir_all(&staged) {
        warn!(
            "event=move_cleanup module=fs status=error path={} error={err}",
            staged.display()
        );
    }
    Ok(())
}

fn staging_path(from: &Path) -> PathBuf {
    let name = from
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    from.with_file_name(format!(".{name}.moving"))
}

/// Removes a file or directory tree.
pub fn remove_any(path: &Path) -> std::io::Result<()> {
    if path.symlink_metadata()?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    if from.is_dir() {
        fs::create_dir(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(from, to).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::move_path;
    use std::fs;
    use std::io::ErrorKind;

    #[test]
    fn move_path_moves_directory_trees() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        fs::create_dir_all(from.join(".notes")).unwrap();
        fs::write(from.join(".notes").join("x.txt"), "x").unwrap();

        let to = dir.path().join("b");
        move_path(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(
            fs::read_to_string(to.join(".notes").join("x.txt")).unwrap(),
            "x"
        );
    }

    #[test]
    fn move_path_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("b.txt");
        fs::write(&from, "a").unwrap();
        fs::write(&to, "b").unwrap();

        let err = move_path(&from, &to).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&to).unwrap(), "b");
        assert!(from.exists());
    }

    #[test]
    fn move_path_returns_non_cross_device_errors_without_copying() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a");
        fs::create_dir_all(from.join("sub")).unwrap();
        fs::write(from.join("x.txt"), "x").unwrap();
        let to = from.join("sub").join("b");

        let err = move_path(&from, &to).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::CrossesDevices);
        assert!(!to.exists());
        assert_eq!(fs::read_to_string(from.join("x.txt")).unwrap(), "x");
        assert_eq!(fs::read_dir(from.join("sub")).unwrap().count(), 0);
    }

    #[test]
    fn staging_path_is_a_hidden_sibling() {
        let staged = super::staging_path(std::path::Path::new("/r/work"));
        assert_eq!(staged, std::path::Path::new("/r/.work.moving"));
    }

    #[test]
    fn move_path_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = move_path(&dir.path().join("nope"), &dir.path().join("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
