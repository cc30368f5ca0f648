//! Artifact file moves, copies, and removals.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy a directory tree. Existing files at the destination are overwritten.
pub fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy a file or directory to `to`, creating parents.
pub fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_dir() {
        return copy_dir(from, to);
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

/// Move a file or directory, falling back to copy-and-remove when a rename
/// crosses filesystems.
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    copy_path(from, to)?;
    remove_path(from)?;
    Ok(())
}

/// Remove a file or directory tree. Returns `false` if nothing was there.
pub fn remove_path(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).map(|_| true),
        Ok(_) => fs::remove_file(path).map(|_| true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_dir_recurses() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested/b.txt"), "b").unwrap();

        let dst = dir.path().join("dst");
        copy_dir(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
        assert!(src.join("a.txt").exists());
    }

    #[test]
    fn test_move_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "a").unwrap();
        let dst = dir.path().join("x/y/a.txt");
        move_path(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst).unwrap(), "a");
    }

    #[test]
    fn test_remove_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        assert!(!remove_path(&file).unwrap());
        fs::write(&file, "a").unwrap();
        assert!(remove_path(&file).unwrap());
        fs::create_dir_all(dir.path().join("d/e")).unwrap();
        assert!(remove_path(&dir.path().join("d")).unwrap());
    }
}
