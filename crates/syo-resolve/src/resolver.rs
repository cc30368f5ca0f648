//! # Path Resolver
//!
//! Turns a descriptor facet into a concrete local path. Artifacts may sit in
//! a staging area, inside a synced datasite, or somewhere the user moved
//! them by hand, so resolution walks a fixed ladder of strategies with
//! weaker assumptions at each rung and takes the first hit:
//!
//! 1. [`Strategy::Relative`]: `basePath` joined with the facet's relative path.
//! 2. [`Strategy::Scheme`]: the addressing client's mapping of the URL.
//! 3. [`Strategy::AbsoluteFallback`]: the recorded absolute path.
//! 4. [`Strategy::Search`]: filename search below a fixed list of roots.
//!
//! ## Invariants
//!
//! - Resolution never fails. Absence is `None`, and client errors are
//!   logged at debug and treated as a miss.
//! - Given an unchanged filesystem, repeated calls return the same path from
//!   the same strategy. The bounded search walks entries in name order.
//! - Folder-kind private and mock facets only accept directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use syo_core::{Descriptor, Facet};
use walkdir::WalkDir;

use crate::client::AddressingClient;
use crate::paths::{absolutize, normalize, relative_path};

/// Default staging directory, relative to the working directory.
pub const DEFAULT_STAGING_DIR: &str = "tmp";

/// Default depth of the recursive filename search below each root.
pub const DEFAULT_SEARCH_DEPTH: usize = 4;

/// A resolution strategy. Variants are tried in [`Strategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Relative,
    Scheme,
    AbsoluteFallback,
    Search,
}

impl Strategy {
    pub const ORDER: [Strategy; 4] = [
        Strategy::Relative,
        Strategy::Scheme,
        Strategy::AbsoluteFallback,
        Strategy::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::Scheme => "scheme",
            Self::AbsoluteFallback => "absolute-fallback",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful resolution and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub strategy: Strategy,
}

/// Resolves descriptor facets to local paths.
#[derive(Clone)]
pub struct PathResolver {
    client: Arc<dyn AddressingClient>,
    cwd: PathBuf,
    /// Directory a relative `basePath` is anchored at. Set to the sidecar's
    /// directory for descriptors loaded from disk.
    anchor: Option<PathBuf>,
    staging_dir: PathBuf,
    search_depth: usize,
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("client", &self.client.client_name())
            .field("cwd", &self.cwd)
            .field("anchor", &self.anchor)
            .field("staging_dir", &self.staging_dir)
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

impl PathResolver {
    /// A resolver working relative to `cwd`, staging in `cwd/tmp`.
    pub fn new(client: Arc<dyn AddressingClient>, cwd: impl Into<PathBuf>) -> Self {
        let cwd = normalize(&cwd.into());
        let staging_dir = cwd.join(DEFAULT_STAGING_DIR);
        Self {
            client,
            cwd,
            anchor: None,
            staging_dir,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Override the staging directory. Relative paths are taken against `cwd`.
    pub fn with_staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.staging_dir = absolutize(dir.as_ref(), &self.cwd);
        self
    }

    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// A copy of this resolver that anchors relative `basePath` values at `dir`.
    pub fn anchored(&self, dir: &Path) -> Self {
        let mut resolver = self.clone();
        resolver.anchor = Some(absolutize(dir, &self.cwd));
        resolver
    }

    pub fn client(&self) -> &Arc<dyn AddressingClient> {
        &self.client
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Absolute form of the descriptor's `basePath`, if set.
    pub fn base_dir(&self, descriptor: &Descriptor) -> Option<PathBuf> {
        let base = descriptor.base_path.as_deref()?;
        let anchor = self.anchor.as_deref().unwrap_or(&self.cwd);
        Some(absolutize(base, anchor))
    }

    /// Resolve one facet to an existing local path.
    pub fn resolve(&self, descriptor: &Descriptor, facet: Facet) -> Option<PathBuf> {
        self.resolve_traced(descriptor, facet).map(|r| r.path)
    }

    /// Resolve one facet and report which strategy succeeded.
    pub fn resolve_traced(&self, descriptor: &Descriptor, facet: Facet) -> Option<Resolution> {
        for strategy in Strategy::ORDER {
            if let Some(path) = self.attempt(strategy, descriptor, facet) {
                tracing::trace!(
                    id = %descriptor.id(),
                    facet = %facet,
                    strategy = %strategy,
                    path = %path.display(),
                    "facet resolved"
                );
                return Some(Resolution { path, strategy });
            }
        }
        None
    }

    /// Run a single strategy.
    pub fn attempt(
        &self,
        strategy: Strategy,
        descriptor: &Descriptor,
        facet: Facet,
    ) -> Option<PathBuf> {
        let want_dir = expects_directory(descriptor, facet);
        match strategy {
            Strategy::Relative => {
                let base = self.base_dir(descriptor)?;
                let rel = descriptor.relative(facet)?;
                let candidate = normalize(&base.join(rel));
                accept(&candidate, want_dir).then_some(candidate)
            }
            Strategy::Scheme => {
                let url = descriptor.location(facet)?;
                match self.client.to_local_path(url) {
                    Ok(Some(path)) => {
                        let candidate = absolutize(&path, &self.cwd);
                        accept(&candidate, want_dir).then_some(candidate)
                    }
                    Ok(None) => None,
                    Err(e) => {
                        tracing::debug!(
                            client = self.client.client_name(),
                            url = %url,
                            error = %e,
                            "addressing client failed; trying next strategy"
                        );
                        None
                    }
                }
            }
            Strategy::AbsoluteFallback => {
                let recorded = descriptor.absolute_fallback(facet)?;
                let candidate = absolutize(recorded, &self.cwd);
                accept(&candidate, want_dir).then_some(candidate)
            }
            Strategy::Search => {
                let url = descriptor.location(facet)?;
                let name = url.filename();
                if name.is_empty() {
                    return None;
                }
                self.search_roots(descriptor)
                    .iter()
                    .find_map(|root| self.search_root(root, name, want_dir))
            }
        }
    }

    /// Roots searched by [`Strategy::Search`], in order, without duplicates.
    pub fn search_roots(&self, descriptor: &Descriptor) -> Vec<PathBuf> {
        let mut roots = vec![self.staging_dir.clone(), self.cwd.clone()];
        if let Some(root) = self.client.local_root() {
            roots.push(absolutize(&root, &self.cwd));
        }
        if let Some(base) = self.base_dir(descriptor) {
            if let Some(parent) = base.parent() {
                let parent = parent.to_path_buf();
                roots.push(base);
                roots.push(parent);
            } else {
                roots.push(base);
            }
        }
        let mut unique = Vec::with_capacity(roots.len());
        for root in roots {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        unique
    }

    fn search_root(&self, root: &Path, name: &str, want_dir: bool) -> Option<PathBuf> {
        if !root.is_dir() {
            return None;
        }
        let direct = root.join(name);
        if accept(&direct, want_dir) {
            return Some(direct);
        }
        WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.search_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| {
                e.file_name().to_str() == Some(name)
                    && if want_dir {
                        e.file_type().is_dir()
                    } else {
                        !e.file_type().is_dir()
                    }
            })
            .map(|e| e.into_path())
    }

    /// Re-derive the portable paths of every facet that currently resolves.
    ///
    /// Each resolved facet gets its absolute fallback overwritten with the
    /// resolved path and, when `basePath` is set, its relative path
    /// recomputed against it. Facets that do not resolve are left alone.
    /// Returns the facets that were updated. Calling this twice without a
    /// filesystem change leaves the descriptor as the first call did.
    pub fn update_relative_paths(&self, descriptor: &mut Descriptor) -> Vec<Facet> {
        let base = self.base_dir(descriptor);
        let mut updated = Vec::new();
        for facet in Facet::ALL {
            let Some(resolved) = self.resolve(descriptor, facet) else {
                continue;
            };
            if let Some(base) = &base {
                descriptor.set_relative(facet, Some(relative_path(base, &resolved)));
            }
            descriptor.set_absolute_fallback(facet, Some(resolved));
            updated.push(facet);
        }
        updated
    }
}

fn expects_directory(descriptor: &Descriptor, facet: Facet) -> bool {
    descriptor.is_folder() && facet != Facet::Discovery
}

fn accept(path: &Path, want_dir: bool) -> bool {
    if want_dir {
        path.is_dir()
    } else {
        path.exists() && !path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DatasitesClient;
    use syo_core::{ObjectId, ObjectKind, SyftUrl, Visibility};

    fn descriptor(owner: &str, name: &str) -> Descriptor {
        let mut d = Descriptor::new(ObjectId::new(), ObjectKind::File);
        d.private_location = Some(SyftUrl::object(owner, Visibility::Private, name));
        d
    }

    #[test]
    fn test_scheme_strategy_uses_datasites_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("datasites");
        let file = root.join("a@b.c/private/objects/x.txt");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "x").unwrap();

        let resolver = PathResolver::new(Arc::new(DatasitesClient::new(&root)), dir.path());
        let hit = resolver
            .resolve_traced(&descriptor("a@b.c", "x.txt"), Facet::Private)
            .unwrap();
        assert_eq!(hit.strategy, Strategy::Scheme);
        assert_eq!(hit.path, file);
    }

    #[test]
    fn test_missing_everywhere_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let resolver =
            PathResolver::new(Arc::new(DatasitesClient::new(dir.path().join("nope"))), dir.path());
        assert!(resolver.resolve(&descriptor("a@b.c", "x.txt"), Facet::Private).is_none());
        assert!(resolver.resolve(&descriptor("a@b.c", "x.txt"), Facet::Mock).is_none());
    }

    #[test]
    fn test_folder_kind_rejects_file_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("job"), "not a dir").unwrap();
        let mut d = Descriptor::new(ObjectId::new(), ObjectKind::Folder);
        d.private_location = Some(SyftUrl::folder("a@b.c", Visibility::Private, "job"));
        let resolver =
            PathResolver::new(Arc::new(DatasitesClient::new(dir.path().join("ds"))), dir.path());
        assert!(resolver.resolve(&d, Facet::Private).is_none());

        std::fs::create_dir_all(dir.path().join("nested/job")).unwrap();
        assert_eq!(
            resolver.resolve(&d, Facet::Private),
            Some(dir.path().join("nested/job"))
        );
    }

    #[test]
    fn test_relative_base_anchored_at_sidecar_dir() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(project.join("data")).unwrap();
        std::fs::write(project.join("data/x.txt"), "x").unwrap();

        let mut d = descriptor("a@b.c", "x.txt");
        d.base_path = Some(PathBuf::from("."));
        d.private_location_relative = Some(PathBuf::from("data/x.txt"));

        let resolver =
            PathResolver::new(Arc::new(DatasitesClient::new(dir.path().join("ds"))), "/elsewhere");
        let anchored = resolver.anchored(&project);
        let hit = anchored.resolve_traced(&d, Facet::Private).unwrap();
        assert_eq!(hit.strategy, Strategy::Relative);
        assert_eq!(hit.path, project.join("data/x.txt"));
    }

    #[test]
    fn test_search_roots_order_and_dedup() {
        let resolver = PathResolver::new(Arc::new(DatasitesClient::new("/ds")), "/work")
            .with_staging_dir("stage");
        let mut d = descriptor("a@b.c", "x.txt");
        d.base_path = Some(PathBuf::from("/work"));
        assert_eq!(
            resolver.search_roots(&d),
            vec![
                PathBuf::from("/work/stage"),
                PathBuf::from("/work"),
                PathBuf::from("/ds"),
                PathBuf::from("/"),
            ]
        );
    }
}
