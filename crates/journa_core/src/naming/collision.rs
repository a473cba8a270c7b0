//! Unique on-disk name resolution.
//!
//! # Invariants
//! - Probing is linear and deterministic: `base`, `base_2`, `base_3`, ...
//! - The returned path did not exist at probe time.

use std::path::{Path, PathBuf};

/// First numeric suffix tried after the bare base slug.
const FIRST_SUFFIX: u32 = 2;

/// Free name picked under one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Slug without extension, possibly suffixed.
    pub slug: String,
    /// Full candidate path `dir/slug+ext`.
    pub path: PathBuf,
}

impl ResolvedName {
    /// Returns whether a numeric suffix had to be appended.
    pub fn was_disambiguated(&self, base_slug: &str) -> bool {
        self.slug != base_slug
    }
}

/// Resolves a free `base_slug + ext` name under `dir`.
pub fn resolve(dir: &Path, base_slug: &str, ext: &str) -> ResolvedName {
    let mut slug = base_slug.to_string();
    let mut counter = FIRST_SUFFIX;
    loop {
        let path = dir.join(format!("{slug}{ext}"));
        if !path_taken(&path) {
            return ResolvedName { slug, path };
        }
        slug = format!("{base_slug}_{counter}");
        counter += 1;
    }
}

fn path_taken(path: &Path) -> bool {
    // Dangling symlinks still occupy the name.
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use std::fs;

    #[test]
    fn free_name_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(dir.path(), "monday", ".txt");
        assert_eq!(resolved.slug, "monday");
        assert_eq!(resolved.path, dir.path().join("monday.txt"));
        assert!(!resolved.was_disambiguated("monday"));
    }

    #[test]
    fn colliding_names_get_ascending_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let mut names = Vec::new();
        for _ in 0..4 {
            let resolved = resolve(dir.path(), "name", ".txt");
            fs::write(&resolved.path, "").unwrap();
            names.push(resolved.slug);
        }
        assert_eq!(names, vec!["name", "name_2", "name_3", "name_4"]);
    }

    #[test]
    fn probing_fills_the_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("name.txt"), "").unwrap();
        fs::write(dir.path().join("name_3.txt"), "").unwrap();
        let resolved = resolve(dir.path(), "name", ".txt");
        assert_eq!(resolved.slug, "name_2");
    }

    #[test]
    fn directories_count_as_taken() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("daily")).unwrap();
        let resolved = resolve(dir.path(), "daily", "");
        assert_eq!(resolved.slug, "daily_2");
    }
}
