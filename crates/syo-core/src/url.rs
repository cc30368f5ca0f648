//! # Scheme URLs
//!
//! `syft://<owner>/<path>` addresses an artifact independently of where the
//! owner's datasite is mounted locally. Objects live under
//! `syft://<owner>/<visibility>/objects/<filename>`; folder locations end
//! with `/`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SyoError;

/// URL scheme prefix.
pub const SCHEME: &str = "syft://";

/// Which principals may learn that a location exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone.
    Public,
    /// Visible to the owner and explicitly granted principals.
    Private,
}

impl Visibility {
    /// Both scopes, in scan order.
    pub const ALL: [Visibility; 2] = [Visibility::Public, Visibility::Private];

    /// Path segment used in URLs and on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `syft://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyftUrl {
    owner: String,
    path: String,
}

impl SyftUrl {
    /// Parse a `syft://owner/path` URL.
    ///
    /// # Errors
    ///
    /// Returns `SyoError::InvalidLocation` if the scheme is wrong, the owner
    /// is empty, or the path is empty.
    pub fn parse(raw: &str) -> Result<Self, SyoError> {
        let rest = raw.strip_prefix(SCHEME).ok_or_else(|| SyoError::InvalidLocation {
            url: raw.to_string(),
            reason: format!("expected {SCHEME} prefix"),
        })?;
        let (owner, path) = rest.split_once('/').ok_or_else(|| SyoError::InvalidLocation {
            url: raw.to_string(),
            reason: "missing path after owner".to_string(),
        })?;
        if owner.is_empty() {
            return Err(SyoError::InvalidLocation {
                url: raw.to_string(),
                reason: "empty owner".to_string(),
            });
        }
        if path.trim_matches('/').is_empty() {
            return Err(SyoError::InvalidLocation {
                url: raw.to_string(),
                reason: "empty path".to_string(),
            });
        }
        Ok(Self {
            owner: owner.to_string(),
            path: path.to_string(),
        })
    }

    /// Canonical file location `syft://owner/visibility/objects/filename`.
    pub fn object(owner: &str, visibility: Visibility, filename: &str) -> Self {
        Self {
            owner: owner.to_string(),
            path: format!("{visibility}/objects/{}", filename.trim_matches('/')),
        }
    }

    /// Canonical folder location, always ending with `/`.
    pub fn folder(owner: &str, visibility: Visibility, name: &str) -> Self {
        Self::object(owner, visibility, name).into_folder()
    }

    /// Directory URL holding all objects of one owner and scope.
    pub fn objects_dir(owner: &str, visibility: Visibility) -> Self {
        Self {
            owner: owner.to_string(),
            path: format!("{visibility}/objects/"),
        }
    }

    /// The owner (datasite) identifier.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The path below the owner, without leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The visibility scope, if the first path segment names one.
    pub fn visibility(&self) -> Option<Visibility> {
        match self.path.split('/').next() {
            Some("public") => Some(Visibility::Public),
            Some("private") => Some(Visibility::Private),
            _ => None,
        }
    }

    /// Whether the URL denotes a directory.
    pub fn is_folder(&self) -> bool {
        self.path.ends_with('/')
    }

    /// The last non-empty path segment.
    pub fn filename(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// The extension of the last segment as written, without the dot.
    /// Folders never have one.
    pub fn extension(&self) -> Option<String> {
        if self.is_folder() {
            return None;
        }
        extension_of(self.filename())
    }

    /// Same location, ending with `/`.
    pub fn into_folder(mut self) -> Self {
        if !self.path.ends_with('/') {
            self.path.push('/');
        }
        self
    }

    /// Same directory, different last segment.
    pub fn with_filename(&self, filename: &str) -> Self {
        let trimmed = self.path.trim_end_matches('/');
        let parent = match trimmed.rsplit_once('/') {
            Some((parent, _)) => format!("{parent}/"),
            None => String::new(),
        };
        let mut path = format!("{parent}{}", filename.trim_matches('/'));
        if self.is_folder() {
            path.push('/');
        }
        Self {
            owner: self.owner.clone(),
            path,
        }
    }

    /// Map onto a local datasite root: `root/<owner>/<path>`.
    pub fn to_local_path(&self, root: &Path) -> PathBuf {
        let mut local = root.join(&self.owner);
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            local.push(segment);
        }
        local
    }
}

impl fmt::Display for SyftUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}/{}", self.owner, self.path)
    }
}

impl std::str::FromStr for SyftUrl {
    type Err = SyoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SyftUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SyftUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SyftUrl::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Extension of a filename as written, ignoring leading-dot names like `.env`.
///
/// Case is preserved: `data.CSV` and `data.csv` have different extensions.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_string())
}
