//! # Addressing Client
//!
//! Boundary to the transport that maps `syft://` URLs onto a local mount of
//! each owner's datasite. The transport itself (sync, fetch) lives outside
//! this workspace; resolution only asks it where a URL would be on disk.
//!
//! Implementations must be `Send + Sync` so a single client can be shared
//! behind an `Arc` by the resolver, the registry, and the collection.

use std::fs;
use std::path::{Path, PathBuf};

use syo_core::SyftUrl;

/// Errors reported by an addressing client.
///
/// The resolver swallows these; they only surface to callers that use the
/// client directly, such as owner enumeration during a collection refresh.
#[derive(Debug, thiserror::Error)]
pub enum AddressingError {
    /// The transport is not configured or its local mount is missing.
    #[error("addressing client unavailable: {0}")]
    Unavailable(String),

    /// The URL cannot be mapped by this client.
    #[error("cannot map {url}: {reason}")]
    InvalidUrl {
        /// The URL that was rejected.
        url: String,
        /// Why the client rejected it.
        reason: String,
    },

    /// IO error while inspecting the local mount.
    #[error("addressing io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts scheme URLs into local paths.
pub trait AddressingClient: Send + Sync {
    /// Local path for `url`, or `None` if the client knows the URL cannot be
    /// present locally. The returned path is not guaranteed to exist.
    fn to_local_path(&self, url: &SyftUrl) -> Result<Option<PathBuf>, AddressingError>;

    /// Owners whose datasites are visible through this client.
    fn list_known_owners(&self) -> Result<Vec<String>, AddressingError>;

    /// Default local root for the scheme, searched by the heuristic strategy.
    fn local_root(&self) -> Option<PathBuf>;

    /// Human-readable implementation name, used in logs.
    fn client_name(&self) -> &str;
}

/// Client backed by a local datasites directory laid out as
/// `<root>/<owner>/<path>`.
#[derive(Debug, Clone)]
pub struct DatasitesClient {
    root: PathBuf,
}

impl DatasitesClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn require_root(&self) -> Result<(), AddressingError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(AddressingError::Unavailable(format!(
                "datasites root {} does not exist",
                self.root.display()
            )))
        }
    }
}

impl AddressingClient for DatasitesClient {
    fn to_local_path(&self, url: &SyftUrl) -> Result<Option<PathBuf>, AddressingError> {
        self.require_root()?;
        if url.path().split('/').any(|s| s == "..") {
            return Err(AddressingError::InvalidUrl {
                url: url.to_string(),
                reason: "path escapes the owner's datasite".to_string(),
            });
        }
        Ok(Some(url.to_local_path(&self.root)))
    }

    fn list_known_owners(&self) -> Result<Vec<String>, AddressingError> {
        self.require_root()?;
        let mut owners = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    owners.push(name.to_string());
                }
            }
        }
        owners.sort();
        Ok(owners)
    }

    fn local_root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }

    fn client_name(&self) -> &str {
        "DatasitesClient"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_url_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let client = DatasitesClient::new(dir.path());
        let url = SyftUrl::parse("syft://a@b.c/public/objects/x.txt").unwrap();
        let path = client.to_local_path(&url).unwrap().unwrap();
        assert_eq!(path, dir.path().join("a@b.c/public/objects/x.txt"));
    }

    #[test]
    fn test_missing_root_is_unavailable() {
        let client = DatasitesClient::new("/definitely/not/here");
        let url = SyftUrl::parse("syft://a@b.c/public/objects/x.txt").unwrap();
        assert!(matches!(
            client.to_local_path(&url),
            Err(AddressingError::Unavailable(_))
        ));
        assert!(client.list_known_owners().is_err());
    }

    #[test]
    fn test_rejects_parent_segments() {
        let dir = tempfile::tempdir().unwrap();
        let client = DatasitesClient::new(dir.path());
        let url = SyftUrl::parse("syft://a@b.c/public/../../etc/passwd").unwrap();
        assert!(matches!(
            client.to_local_path(&url),
            Err(AddressingError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_lists_owner_directories_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for owner in ["zed@x.y", "amy@x.y", ".hidden"] {
            fs::create_dir_all(dir.path().join(owner)).unwrap();
        }
        fs::write(dir.path().join("stray.txt"), "x").unwrap();
        let owners = DatasitesClient::new(dir.path()).list_known_owners().unwrap();
        assert_eq!(owners, vec!["amy@x.y".to_string(), "zed@x.y".to_string()]);
    }
}
