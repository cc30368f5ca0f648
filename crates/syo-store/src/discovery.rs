//! Sidecar discovery on disk.

use std::path::{Path, PathBuf};

use syo_core::sidecar::is_sidecar_path;
use walkdir::WalkDir;

/// Every sidecar below `root`, in path order. Unreadable entries are skipped.
pub fn find_sidecars(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_sidecar_path(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Sidecars directly inside `dir`, in name order.
pub fn sidecars_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_sidecar_path(e.path()))
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_sidecars_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("b/c/z.syftobject.yaml"), "").unwrap();
        fs::write(dir.path().join("a.syftobject.yaml"), "").unwrap();
        fs::write(dir.path().join("a.yaml"), "").unwrap();
        fs::write(dir.path().join(".syftobject.yaml"), "").unwrap();

        let found = find_sidecars(dir.path());
        assert_eq!(
            found,
            vec![
                dir.path().join("a.syftobject.yaml"),
                dir.path().join("b/c/z.syftobject.yaml"),
            ]
        );
        assert_eq!(sidecars_in(dir.path()), vec![dir.path().join("a.syftobject.yaml")]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        assert!(find_sidecars(Path::new("/nonexistent/syo")).is_empty());
    }
}
