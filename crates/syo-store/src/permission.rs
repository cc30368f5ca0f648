//! # Permission Delegate
//!
//! Boundary to the capability store that enforces who may read, write, or
//! administer a path. The store only pushes and reads grants; enforcement
//! happens behind the delegate.
//!
//! ## Degraded results
//!
//! A backend failure never fails the enclosing operation. Calls that touch
//! the delegate return `Result<T, Degraded<T>>`: `Ok` when the backend
//! answered, `Err(Degraded)` when the store carried on with the capability
//! lists recorded in the descriptor. Callers decide whether degraded is
//! good enough.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use syo_core::{Access, CapabilityList, Descriptor, Facet};

/// Name of the per-directory rules file.
pub const SYFT_PUB_FILE: &str = "syft.pub.yaml";

/// Grants on one path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    pub read: CapabilityList,
    #[serde(default)]
    pub write: CapabilityList,
    #[serde(default)]
    pub admin: CapabilityList,
}

impl PermissionSet {
    /// The grants a descriptor records for one facet. Admin is always the
    /// owner; the discovery facet is writable only by the owner.
    pub fn from_descriptor(descriptor: &Descriptor, facet: Facet) -> Self {
        let owner = descriptor.owner().to_string();
        let read = descriptor
            .capabilities(facet, Access::Read)
            .cloned()
            .unwrap_or_default();
        let write = descriptor
            .capabilities(facet, Access::Write)
            .cloned()
            .unwrap_or_else(|| CapabilityList::only(owner.clone()));
        Self {
            read,
            write,
            admin: CapabilityList::only(owner),
        }
    }
}

/// Errors from a permission backend.
#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("permission backend unavailable: {0}")]
    Unavailable(String),
    #[error("malformed permission rules at {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("permission io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a result fell back to in-descriptor capability lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedReason {
    /// The backend failed.
    BackendUnavailable(String),
    /// The backend answered but holds no entry for the path.
    NoEntry,
    /// The artifact does not resolve locally, so there is no path to ask about.
    Unresolved,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable(reason) => write!(f, "backend unavailable: {reason}"),
            Self::NoEntry => f.write_str("no entry in backend"),
            Self::Unresolved => f.write_str("artifact not resolvable"),
        }
    }
}

/// A result produced without the backend's cooperation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degraded<T> {
    pub reason: DegradedReason,
    pub fallback: T,
}

/// Outcome of pushing grants to the backend.
pub type PushOutcome = Result<(), Degraded<()>>;

/// Stores and retrieves grants keyed by local path.
pub trait PermissionDelegate: Send + Sync {
    /// Grants recorded for `path`, if any.
    fn get(&self, path: &Path) -> Result<Option<PermissionSet>, PermissionError>;

    /// Replace the grants for `path`.
    fn set(&self, path: &Path, permissions: &PermissionSet) -> Result<(), PermissionError>;

    /// Forget the grants for `path`. Absent entries are not an error.
    fn remove(&self, path: &Path) -> Result<(), PermissionError>;

    fn delegate_name(&self) -> &str;
}

/// Push grants, absorbing backend failure.
pub fn push(
    delegate: &dyn PermissionDelegate,
    path: &Path,
    permissions: &PermissionSet,
) -> PushOutcome {
    delegate.set(path, permissions).map_err(|e| {
        tracing::warn!(
            delegate = delegate.delegate_name(),
            path = %path.display(),
            error = %e,
            "permission backend degraded; descriptor lists remain authoritative"
        );
        Degraded {
            reason: DegradedReason::BackendUnavailable(e.to_string()),
            fallback: (),
        }
    })
}

/// Fetch grants, falling back to `fallback` when the backend cannot answer.
pub fn fetch(
    delegate: &dyn PermissionDelegate,
    path: &Path,
    fallback: PermissionSet,
) -> Result<PermissionSet, Degraded<PermissionSet>> {
    match delegate.get(path) {
        Ok(Some(set)) => Ok(set),
        Ok(None) => Err(Degraded {
            reason: DegradedReason::NoEntry,
            fallback,
        }),
        Err(e) => {
            tracing::warn!(
                delegate = delegate.delegate_name(),
                path = %path.display(),
                error = %e,
                "permission backend degraded; using descriptor lists"
            );
            Err(Degraded {
                reason: DegradedReason::BackendUnavailable(e.to_string()),
                fallback,
            })
        }
    }
}

/// Collapse a degraded result into its value.
pub fn value_of<T>(result: Result<T, Degraded<T>>) -> T {
    match result {
        Ok(value) => value,
        Err(degraded) => degraded.fallback,
    }
}

/// Delegate holding grants in memory. Can be switched to fail every call.
#[derive(Debug, Default)]
pub struct InMemoryDelegate {
    entries: Mutex<HashMap<PathBuf, PermissionSet>>,
    unavailable: AtomicBool,
}

impl InMemoryDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), PermissionError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PermissionError::Unavailable("in-memory delegate switched off".to_string()));
        }
        Ok(())
    }

    fn entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<PathBuf, PermissionSet>>, PermissionError> {
        self.entries
            .lock()
            .map_err(|_| PermissionError::Unavailable("permission map lock poisoned".to_string()))
    }
}

impl PermissionDelegate for InMemoryDelegate {
    fn get(&self, path: &Path) -> Result<Option<PermissionSet>, PermissionError> {
        self.check()?;
        Ok(self.entries()?.get(path).cloned())
    }

    fn set(&self, path: &Path, permissions: &PermissionSet) -> Result<(), PermissionError> {
        self.check()?;
        self.entries()?.insert(path.to_path_buf(), permissions.clone());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), PermissionError> {
        self.check()?;
        self.entries()?.remove(path);
        Ok(())
    }

    fn delegate_name(&self) -> &str {
        "InMemoryDelegate"
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Rule {
    pattern: String,
    access: PermissionSet,
}

/// Delegate storing grants in a `syft.pub.yaml` beside each artifact, one
/// rule per file name (`name`) or folder (`name/**`).
#[derive(Debug, Default, Clone)]
pub struct SyftPubDelegate;

impl SyftPubDelegate {
    pub fn new() -> Self {
        Self
    }

    fn locate(path: &Path) -> Result<(PathBuf, String), PermissionError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PermissionError::Unavailable(format!("no file name in {}", path.display()))
            })?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let pattern = if path.is_dir() {
            format!("{name}/**")
        } else {
            name.to_string()
        };
        Ok((dir.join(SYFT_PUB_FILE), pattern))
    }

    fn load(file: &Path) -> Result<RulesFile, PermissionError> {
        if !file.exists() {
            return Ok(RulesFile::default());
        }
        let text = fs::read_to_string(file)?;
        if text.trim().is_empty() {
            return Ok(RulesFile::default());
        }
        serde_yaml::from_str(&text).map_err(|e| PermissionError::Malformed {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn store(file: &Path, rules: &RulesFile) -> Result<(), PermissionError> {
        if rules.rules.is_empty() {
            if file.exists() {
                fs::remove_file(file)?;
            }
            return Ok(());
        }
        let yaml = serde_yaml::to_string(rules).map_err(|e| PermissionError::Malformed {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(file, yaml)?;
        Ok(())
    }
}

impl PermissionDelegate for SyftPubDelegate {
    fn get(&self, path: &Path) -> Result<Option<PermissionSet>, PermissionError> {
        let (file, pattern) = Self::locate(path)?;
        let rules = Self::load(&file)?;
        Ok(rules
            .rules
            .into_iter()
            .find(|r| r.pattern == pattern)
            .map(|r| r.access))
    }

    fn set(&self, path: &Path, permissions: &PermissionSet) -> Result<(), PermissionError> {
        let (file, pattern) = Self::locate(path)?;
        let mut rules = Self::load(&file)?;
        match rules.rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.access = permissions.clone(),
            None => rules.rules.push(Rule {
                pattern,
                access: permissions.clone(),
            }),
        }
        Self::store(&file, &rules)
    }

    fn remove(&self, path: &Path) -> Result<(), PermissionError> {
        let (file, pattern) = Self::locate(path)?;
        let mut rules = Self::load(&file)?;
        let folder_pattern = format!("{pattern}/**");
        rules
            .rules
            .retain(|r| r.pattern != pattern && r.pattern != folder_pattern);
        Self::store(&file, &rules)
    }

    fn delegate_name(&self) -> &str {
        "SyftPubDelegate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syo_core::{ObjectId, ObjectKind, SyftUrl, Visibility};

    fn grants(reader: &str) -> PermissionSet {
        PermissionSet {
            read: CapabilityList::only(reader),
            write: CapabilityList::only("owner@x.y"),
            admin: CapabilityList::only("owner@x.y"),
        }
    }

    #[test]
    fn test_in_memory_roundtrip() {
        let delegate = InMemoryDelegate::new();
        let path = Path::new("/a/b.txt");
        delegate.set(path, &grants("public")).unwrap();
        assert_eq!(delegate.get(path).unwrap(), Some(grants("public")));
        delegate.remove(path).unwrap();
        assert_eq!(delegate.get(path).unwrap(), None);
    }

    #[test]
    fn test_push_failure_is_degraded() {
        let delegate = InMemoryDelegate::new();
        delegate.set_unavailable(true);
        let outcome = push(&delegate, Path::new("/a"), &grants("public"));
        assert!(matches!(
            outcome,
            Err(Degraded {
                reason: DegradedReason::BackendUnavailable(_),
                ..
            })
        ));
    }

    #[test]
    fn test_fetch_distinguishes_no_entry_from_failure() {
        let delegate = InMemoryDelegate::new();
        let fallback = grants("fallback@x.y");
        let missing = fetch(&delegate, Path::new("/a"), fallback.clone()).unwrap_err();
        assert_eq!(missing.reason, DegradedReason::NoEntry);
        assert_eq!(missing.fallback, fallback);

        delegate.set(Path::new("/a"), &grants("public")).unwrap();
        assert_eq!(fetch(&delegate, Path::new("/a"), fallback.clone()), Ok(grants("public")));
    }

    #[test]
    fn test_syft_pub_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "x").unwrap();
        fs::write(&b, "x").unwrap();

        let delegate = SyftPubDelegate::new();
        delegate.set(&a, &grants("public")).unwrap();
        delegate.set(&b, &grants("bob@x.y")).unwrap();
        delegate.set(&a, &grants("carol@x.y")).unwrap();

        let text = fs::read_to_string(dir.path().join(SYFT_PUB_FILE)).unwrap();
        assert!(text.contains("rules:"));
        assert!(text.contains("pattern: a.csv"));
        assert_eq!(delegate.get(&a).unwrap(), Some(grants("carol@x.y")));
        assert_eq!(delegate.get(&b).unwrap(), Some(grants("bob@x.y")));

        delegate.remove(&a).unwrap();
        delegate.remove(&b).unwrap();
        assert!(!dir.path().join(SYFT_PUB_FILE).exists());
    }

    #[test]
    fn test_syft_pub_folder_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("job");
        fs::create_dir_all(&folder).unwrap();
        SyftPubDelegate.set(&folder, &grants("public")).unwrap();
        let text = fs::read_to_string(dir.path().join(SYFT_PUB_FILE)).unwrap();
        assert!(text.contains("job/**"));
    }

    #[test]
    fn test_from_descriptor_discovery_write_is_owner() {
        let mut d = Descriptor::new(ObjectId::new(), ObjectKind::File);
        d.private_location = Some(SyftUrl::object("o@x.y", Visibility::Private, "f.txt"));
        d.discovery_read = CapabilityList::public();
        let set = PermissionSet::from_descriptor(&d, Facet::Discovery);
        assert!(set.read.is_public());
        assert_eq!(set.write.to_vec(), vec!["o@x.y".to_string()]);
        assert_eq!(set.admin.to_vec(), vec!["o@x.y".to_string()]);
    }
}
