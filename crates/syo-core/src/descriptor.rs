//! # Descriptor
//!
//! The persisted record describing one addressable object: where its private,
//! mock, and discovery artifacts live, who may read or write each of them, and
//! the portable-addressing hints that let a moved tree stay resolvable.
//!
//! ## Field names
//!
//! Serialized names are a compatibility contract with every other producer
//! of sidecars. Canonical output is camelCase; the short aliases
//! (`private`, `mock`, `syftobject`) and the legacy snake_case names are
//! accepted on input only.
//!
//! ## Invariants
//!
//! Checked by [`Descriptor::check_invariants`] on load and before save:
//!
//! - File-kind private and mock locations that both carry an extension carry
//!   the same one.
//! - Folder-kind private and mock locations end with `/`; file-kind ones
//!   never do.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityList;
use crate::error::SyoError;
use crate::identity::ObjectId;
use crate::temporal::Timestamp;
use crate::url::{extension_of, SyftUrl};

/// Owner reported when no location names one.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Metadata key holding the free-text note attached to the mock facet.
pub const MOCK_NOTE_KEY: &str = "mock_note";

/// Metadata key recording files staged or moved during creation.
pub const FILE_OPERATIONS_KEY: &str = "_file_operations";

/// Whether a metadata key is internal bookkeeping, hidden from editable views.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_')
}

/// What a location denotes on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A single artifact file.
    #[default]
    File,
    /// A directory tree; its last path segment is never a filename.
    Folder,
}

impl ObjectKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Folder => f.write_str("folder"),
        }
    }
}

/// The role a location plays for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    /// The real artifact.
    Private,
    /// The shareable stand-in.
    Mock,
    /// The sidecar itself, which is how other principals discover the object.
    Discovery,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Private, Facet::Mock, Facet::Discovery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Mock => "mock",
            Self::Discovery => "discovery",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Facet {
    type Err = SyoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "mock" => Ok(Self::Mock),
            "discovery" | "syftobject" => Ok(Self::Discovery),
            other => Err(SyoError::InvariantViolation(format!(
                "unknown facet {other:?}: expected private, mock, or discovery"
            ))),
        }
    }
}

/// Access level of a capability list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

/// The persisted record of one addressable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(alias = "uid")]
    id: ObjectId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        alias = "private",
        alias = "private_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_location: Option<SyftUrl>,
    #[serde(
        default,
        alias = "mock",
        alias = "mock_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub mock_location: Option<SyftUrl>,
    #[serde(default, alias = "syftobject", skip_serializing_if = "Option::is_none")]
    pub discovery_location: Option<SyftUrl>,

    /// Absent only in sidecars from producers that never recorded it.
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,

    /// Root that the `*Relative` paths are relative to. May itself be
    /// relative, in which case it is anchored at the sidecar's directory.
    #[serde(default, alias = "base_path", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_location_relative: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_location_relative: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_location_relative: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_location_absolute_fallback: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_location_absolute_fallback: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_location_absolute_fallback: Option<PathBuf>,

    #[serde(default)]
    pub discovery_read: CapabilityList,
    #[serde(default)]
    pub mock_read: CapabilityList,
    #[serde(default)]
    pub mock_write: CapabilityList,
    #[serde(default)]
    pub private_read: CapabilityList,
    #[serde(default)]
    pub private_write: CapabilityList,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,

    #[serde(default, alias = "object_type")]
    pub kind: ObjectKind,
}

impl Descriptor {
    /// A descriptor with no locations and no grants, created now.
    pub fn new(id: ObjectId, kind: ObjectKind) -> Self {
        Self {
            id,
            name: None,
            description: None,
            private_location: None,
            mock_location: None,
            discovery_location: None,
            created_at: Some(Timestamp::now()),
            updated_at: None,
            base_path: None,
            private_location_relative: None,
            mock_location_relative: None,
            discovery_location_relative: None,
            private_location_absolute_fallback: None,
            mock_location_absolute_fallback: None,
            discovery_location_absolute_fallback: None,
            discovery_read: CapabilityList::new(),
            mock_read: CapabilityList::new(),
            mock_write: CapabilityList::new(),
            private_read: CapabilityList::new(),
            private_write: CapabilityList::new(),
            metadata: BTreeMap::new(),
            kind,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// Owner taken from the private location, then the mock location.
    pub fn owner(&self) -> &str {
        self.private_location
            .as_ref()
            .or(self.mock_location.as_ref())
            .map(SyftUrl::owner)
            .unwrap_or(UNKNOWN_OWNER)
    }

    /// Creation time, with missing values ordering first.
    pub fn created_or_min(&self) -> Timestamp {
        self.created_at.unwrap_or(Timestamp::MIN)
    }

    /// Record a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Some(Timestamp::now());
    }

    pub fn location(&self, facet: Facet) -> Option<&SyftUrl> {
        match facet {
            Facet::Private => self.private_location.as_ref(),
            Facet::Mock => self.mock_location.as_ref(),
            Facet::Discovery => self.discovery_location.as_ref(),
        }
    }

    pub fn set_location(&mut self, facet: Facet, url: SyftUrl) {
        let slot = match facet {
            Facet::Private => &mut self.private_location,
            Facet::Mock => &mut self.mock_location,
            Facet::Discovery => &mut self.discovery_location,
        };
        *slot = Some(url);
    }

    pub fn relative(&self, facet: Facet) -> Option<&Path> {
        match facet {
            Facet::Private => self.private_location_relative.as_deref(),
            Facet::Mock => self.mock_location_relative.as_deref(),
            Facet::Discovery => self.discovery_location_relative.as_deref(),
        }
    }

    pub fn set_relative(&mut self, facet: Facet, path: Option<PathBuf>) {
        match facet {
            Facet::Private => self.private_location_relative = path,
            Facet::Mock => self.mock_location_relative = path,
            Facet::Discovery => self.discovery_location_relative = path,
        }
    }

    pub fn absolute_fallback(&self, facet: Facet) -> Option<&Path> {
        match facet {
            Facet::Private => self.private_location_absolute_fallback.as_deref(),
            Facet::Mock => self.mock_location_absolute_fallback.as_deref(),
            Facet::Discovery => self.discovery_location_absolute_fallback.as_deref(),
        }
    }

    pub fn set_absolute_fallback(&mut self, facet: Facet, path: Option<PathBuf>) {
        match facet {
            Facet::Private => self.private_location_absolute_fallback = path,
            Facet::Mock => self.mock_location_absolute_fallback = path,
            Facet::Discovery => self.discovery_location_absolute_fallback = path,
        }
    }

    /// The capability list for one facet and access level. The discovery
    /// facet has no write list; only its owner may rewrite a sidecar.
    pub fn capabilities(&self, facet: Facet, access: Access) -> Option<&CapabilityList> {
        match (facet, access) {
            (Facet::Discovery, Access::Read) => Some(&self.discovery_read),
            (Facet::Discovery, Access::Write) => None,
            (Facet::Mock, Access::Read) => Some(&self.mock_read),
            (Facet::Mock, Access::Write) => Some(&self.mock_write),
            (Facet::Private, Access::Read) => Some(&self.private_read),
            (Facet::Private, Access::Write) => Some(&self.private_write),
        }
    }

    /// Replace a capability list.
    ///
    /// # Errors
    ///
    /// Returns `SyoError::InvariantViolation` for the discovery write list.
    pub fn set_capabilities(
        &mut self,
        facet: Facet,
        access: Access,
        list: CapabilityList,
    ) -> Result<(), SyoError> {
        let slot = match (facet, access) {
            (Facet::Discovery, Access::Read) => &mut self.discovery_read,
            (Facet::Mock, Access::Read) => &mut self.mock_read,
            (Facet::Mock, Access::Write) => &mut self.mock_write,
            (Facet::Private, Access::Read) => &mut self.private_read,
            (Facet::Private, Access::Write) => &mut self.private_write,
            (Facet::Discovery, Access::Write) => {
                return Err(SyoError::InvariantViolation(
                    "the discovery facet has no write capability list".to_string(),
                ))
            }
        };
        *slot = list;
        Ok(())
    }

    /// Metadata without reserved bookkeeping keys.
    pub fn editable_metadata(&self) -> BTreeMap<String, serde_json::Value> {
        self.metadata
            .iter()
            .filter(|(k, _)| !is_reserved_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Extension shared by the artifacts, or `"folder"`.
    pub fn file_type(&self) -> String {
        if self.is_folder() {
            return "folder".to_string();
        }
        self.private_location
            .as_ref()
            .or(self.mock_location.as_ref())
            .and_then(SyftUrl::extension)
            .unwrap_or_default()
    }

    /// Rewrite folder-kind private and mock locations to end with `/`.
    pub fn normalise(&mut self) {
        if !self.is_folder() {
            return;
        }
        for slot in [&mut self.private_location, &mut self.mock_location] {
            if let Some(url) = slot.take() {
                *slot = Some(url.into_folder());
            }
        }
    }

    /// Check the structural invariants of the record.
    ///
    /// # Errors
    ///
    /// Returns `SyoError::InvalidLocation` when a location's trailing
    /// separator disagrees with `kind`, and `SyoError::InvariantViolation`
    /// when file extensions disagree.
    pub fn check_invariants(&self) -> Result<(), SyoError> {
        for url in [&self.private_location, &self.mock_location].into_iter().flatten() {
            match (self.kind, url.is_folder()) {
                (ObjectKind::Folder, false) => {
                    return Err(SyoError::InvalidLocation {
                        url: url.to_string(),
                        reason: "folder locations must end with '/'".to_string(),
                    })
                }
                (ObjectKind::File, true) => {
                    return Err(SyoError::InvalidLocation {
                        url: url.to_string(),
                        reason: "file locations must not end with '/'".to_string(),
                    })
                }
                _ => {}
            }
        }
        if self.is_folder() {
            return Ok(());
        }
        let private_ext = self
            .private_location
            .as_ref()
            .and_then(|u| extension_of(u.filename()));
        let mock_ext = self
            .mock_location
            .as_ref()
            .and_then(|u| extension_of(u.filename()));
        if let (Some(p), Some(m)) = (private_ext, mock_ext) {
            if p != m {
                return Err(SyoError::InvariantViolation(format!(
                    "mock extension .{m} does not match private extension .{p}"
                )));
            }
        }
        Ok(())
    }
}
