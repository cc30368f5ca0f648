//! # Sidecar Persistence
//!
//! Loads and saves a [`Descriptor`] as a YAML document whose filename carries
//! the `.syftobject.yaml` double suffix. Every load re-checks the descriptor
//! invariants, so a structurally broken sidecar surfaces as
//! `MalformedSidecar` with its path attached.

use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::Descriptor;
use crate::error::SyoError;

/// Double suffix every sidecar filename ends with.
pub const SIDECAR_SUFFIX: &str = ".syftobject.yaml";

/// Whether a path names a sidecar.
pub fn is_sidecar_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SIDECAR_SUFFIX) && n.len() > SIDECAR_SUFFIX.len())
}

/// Force a filename onto the sidecar suffix: `x.yaml` becomes
/// `x.syftobject.yaml`, `x` and `x.txt` gain the full suffix.
pub fn with_sidecar_suffix(filename: &str) -> String {
    if filename.ends_with(SIDECAR_SUFFIX) {
        return filename.to_string();
    }
    match filename.strip_suffix(".yaml") {
        Some(stem) => format!("{stem}{SIDECAR_SUFFIX}"),
        None => format!("{filename}{SIDECAR_SUFFIX}"),
    }
}

fn require_sidecar_name(path: &Path) -> Result<(), SyoError> {
    if is_sidecar_path(path) {
        Ok(())
    } else {
        Err(SyoError::InvalidSidecarName {
            path: path.to_path_buf(),
        })
    }
}

/// Load a descriptor from a sidecar file.
///
/// # Errors
///
/// - `InvalidSidecarName` if the filename lacks the double suffix.
/// - `Io` if the file cannot be read.
/// - `MalformedSidecar` if the YAML does not parse or violates an invariant.
pub fn load(path: &Path) -> Result<Descriptor, SyoError> {
    require_sidecar_name(path)?;
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|reason| SyoError::MalformedSidecar {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse(text: &str) -> Result<Descriptor, String> {
    let mut descriptor: Descriptor = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    descriptor.normalise();
    descriptor.check_invariants().map_err(|e| e.to_string())?;
    Ok(descriptor)
}

/// Render a descriptor as sidecar YAML.
///
/// # Errors
///
/// Returns `SyoError::Serialization` if YAML emission fails.
pub fn to_yaml(descriptor: &Descriptor) -> Result<String, SyoError> {
    serde_yaml::to_string(descriptor).map_err(|e| SyoError::Serialization(e.to_string()))
}

/// Save a descriptor to a sidecar file, creating parent directories.
///
/// # Errors
///
/// - `InvalidSidecarName` if the filename lacks the double suffix.
/// - `InvalidLocation` / `InvariantViolation` if the descriptor is not
///   structurally valid.
/// - `Io` or `Serialization` on write failure.
pub fn save(descriptor: &Descriptor, path: &Path) -> Result<(), SyoError> {
    require_sidecar_name(path)?;
    descriptor.check_invariants()?;
    let yaml = to_yaml(descriptor)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, yaml)?;
    tracing::debug!(path = %path.display(), id = %descriptor.id(), "sidecar saved");
    Ok(())
}

/// Sidecar path `dir/<stem>.syftobject.yaml`.
pub fn sidecar_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}{SIDECAR_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ObjectKind;
    use crate::identity::ObjectId;

    #[test]
    fn test_is_sidecar_path() {
        assert!(is_sidecar_path(Path::new("/x/data_1234.syftobject.yaml")));
        assert!(!is_sidecar_path(Path::new("/x/data.yaml")));
        assert!(!is_sidecar_path(Path::new("/x/.syftobject.yaml")));
    }

    #[test]
    fn test_with_sidecar_suffix() {
        assert_eq!(with_sidecar_suffix("a.syftobject.yaml"), "a.syftobject.yaml");
        assert_eq!(with_sidecar_suffix("a.yaml"), "a.syftobject.yaml");
        assert_eq!(with_sidecar_suffix("a"), "a.syftobject.yaml");
        assert_eq!(with_sidecar_suffix("a.txt"), "a.txt.syftobject.yaml");
    }

    #[test]
    fn test_load_rejects_wrong_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.yaml");
        fs::write(&path, "id: x\n").unwrap();
        assert!(matches!(
            load(&path),
            Err(SyoError::InvalidSidecarName { .. })
        ));
    }

    #[test]
    fn test_load_malformed_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.syftobject.yaml");
        fs::write(&path, "id: [unterminated\n").unwrap();
        match load(&path) {
            Err(SyoError::MalformedSidecar { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected MalformedSidecar, got {other:?}"),
        }
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = sidecar_path(&dir.path().join("nested/deeper"), "obj");
        let d = Descriptor::new(ObjectId::new(), ObjectKind::File);
        save(&d, &path).unwrap();
        assert_eq!(load(&path).unwrap(), d);
    }
}
