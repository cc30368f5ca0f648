//! # Object Handle
//!
//! One facade over a descriptor: the record itself, the sidecar it lives
//! in, and the shared store context. Per-facet access goes through small
//! borrowed accessors, [`FacetView`] for reads and [`FacetEditor`] for
//! mutations.
//!
//! ## Persistence
//!
//! Every mutation bumps `updatedAt` and rewrites the sidecar before
//! returning. Mutations that change a path or a capability list then push
//! the facet's grants to the permission delegate; the push result is
//! returned so callers can tell a degraded push from a clean one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use syo_core::sidecar::{self, with_sidecar_suffix};
use syo_core::url::SCHEME;
use syo_core::{
    is_reserved_key, Access, CapabilityList, Descriptor, Facet, ObjectId, ObjectKind, SyftUrl,
    Timestamp, MOCK_NOTE_KEY,
};
use syo_resolve::paths::{absolutize, relative_path};
use syo_resolve::PathResolver;
use syo_validate::{TypeWarning, ValidationError, ValidationReport};

use crate::error::StoreError;
use crate::factory::{push_all, push_facet};
use crate::fsops::move_path;
use crate::permission::{fetch, Degraded, DegradedReason, PermissionSet, PushOutcome};
use crate::registry::StoreContext;

/// Facade over one persisted descriptor.
#[derive(Debug, Clone)]
pub struct ObjectHandle {
    descriptor: Descriptor,
    sidecar: PathBuf,
    ctx: Arc<StoreContext>,
}

/// Serializable summary of an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: String,
    pub kind: ObjectKind,
    pub file_type: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub private_url: Option<SyftUrl>,
    pub mock_url: Option<SyftUrl>,
    pub discovery_url: Option<SyftUrl>,
    pub private_path: Option<PathBuf>,
    pub mock_path: Option<PathBuf>,
    pub sidecar: PathBuf,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ObjectHandle {
    pub(crate) fn new(descriptor: Descriptor, sidecar: PathBuf, ctx: Arc<StoreContext>) -> Self {
        Self {
            descriptor,
            sidecar,
            ctx,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar
    }

    pub(crate) fn context(&self) -> &StoreContext {
        &self.ctx
    }

    pub fn id(&self) -> &ObjectId {
        self.descriptor.id()
    }

    pub fn name(&self) -> Option<&str> {
        self.descriptor.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        self.descriptor.created_at
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        self.descriptor.updated_at
    }

    pub fn kind(&self) -> ObjectKind {
        self.descriptor.kind
    }

    pub fn owner(&self) -> &str {
        self.descriptor.owner()
    }

    pub fn file_type(&self) -> String {
        self.descriptor.file_type()
    }

    /// Metadata without reserved keys.
    pub fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        self.descriptor.editable_metadata()
    }

    /// Resolver anchored at the sidecar's directory.
    pub fn resolver(&self) -> PathResolver {
        let dir = self.sidecar.parent().unwrap_or(self.ctx.resolver.cwd());
        self.ctx.resolver.anchored(dir)
    }

    /// Resolve a facet. The discovery facet resolves to the sidecar itself
    /// when the usual strategies miss.
    pub fn resolve(&self, facet: Facet) -> Option<PathBuf> {
        self.resolver().resolve(&self.descriptor, facet).or_else(|| {
            (facet == Facet::Discovery && self.sidecar.is_file()).then(|| self.sidecar.clone())
        })
    }

    pub fn private(&self) -> FacetView<'_> {
        self.view(Facet::Private)
    }

    pub fn mock(&self) -> FacetView<'_> {
        self.view(Facet::Mock)
    }

    pub fn discovery(&self) -> FacetView<'_> {
        self.view(Facet::Discovery)
    }

    pub fn view(&self, facet: Facet) -> FacetView<'_> {
        FacetView { handle: self, facet }
    }

    pub fn private_mut(&mut self) -> FacetEditor<'_> {
        self.edit(Facet::Private)
    }

    pub fn mock_mut(&mut self) -> FacetEditor<'_> {
        self.edit(Facet::Mock)
    }

    pub fn discovery_mut(&mut self) -> FacetEditor<'_> {
        self.edit(Facet::Discovery)
    }

    pub fn edit(&mut self, facet: Facet) -> FacetEditor<'_> {
        FacetEditor { handle: self, facet }
    }

    pub fn info(&self) -> ObjectInfo {
        let d = &self.descriptor;
        ObjectInfo {
            id: d.id().to_string(),
            name: d.name.clone(),
            description: d.description.clone(),
            owner: d.owner().to_string(),
            kind: d.kind,
            file_type: d.file_type(),
            created_at: d.created_at,
            updated_at: d.updated_at,
            private_url: d.private_location.clone(),
            mock_url: d.mock_location.clone(),
            discovery_url: d.discovery_location.clone(),
            private_path: self.resolve(Facet::Private),
            mock_path: self.resolve(Facet::Mock),
            sidecar: self.sidecar.clone(),
            metadata: d.editable_metadata(),
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.descriptor.touch();
        sidecar::save(&self.descriptor, &self.sidecar)?;
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), StoreError> {
        self.descriptor.name = Some(name.into());
        self.persist()
    }

    pub fn set_description(&mut self, description: Option<String>) -> Result<(), StoreError> {
        self.descriptor.description = description;
        self.persist()
    }

    /// Replace the editable metadata. Reserved keys already on the
    /// descriptor are kept.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRequest` if `metadata` contains a
    /// reserved key.
    pub fn set_metadata(
        &mut self,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        if let Some(key) = metadata.keys().find(|k| is_reserved_key(k)) {
            return Err(StoreError::InvalidRequest(format!("metadata key '{key}' is reserved")));
        }
        let mut merged: BTreeMap<String, serde_json::Value> = self
            .descriptor
            .metadata
            .iter()
            .filter(|(k, _)| is_reserved_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        merged.extend(metadata);
        self.descriptor.metadata = merged;
        self.persist()
    }

    /// Validate the mock/private pair as it is on disk now.
    ///
    /// # Errors
    ///
    /// - `StoreError::Unresolved` if either artifact does not resolve.
    /// - `StoreError::Validation` on mismatch.
    pub fn validate(&self, skip: bool) -> Result<ValidationReport, StoreError> {
        if skip || self.descriptor.is_folder() {
            return Ok(ValidationReport::unchecked());
        }
        let mock = self.require(Facet::Mock)?;
        let private = self.require(Facet::Private)?;
        Ok(self.ctx.validator.validate(&mock, &private, false)?)
    }

    fn require(&self, facet: Facet) -> Result<PathBuf, StoreError> {
        self.resolve(facet).ok_or_else(|| StoreError::Unresolved {
            facet,
            id: self.id().to_string(),
        })
    }

    /// Re-record relative and absolute paths for every resolvable facet and
    /// persist. Returns the facets that were updated.
    pub fn relink(&mut self) -> Result<Vec<Facet>, StoreError> {
        let resolver = self.resolver();
        let updated = resolver.update_relative_paths(&mut self.descriptor);
        self.persist()?;
        Ok(updated)
    }

    /// Re-read the sidecar, dropping unsaved state.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.descriptor = sidecar::load(&self.sidecar)?;
        Ok(())
    }

    /// Grants the delegate holds for a facet, or the descriptor's own lists
    /// when the delegate cannot answer.
    pub fn effective_permissions(
        &self,
        facet: Facet,
    ) -> Result<PermissionSet, Degraded<PermissionSet>> {
        let fallback = PermissionSet::from_descriptor(&self.descriptor, facet);
        match self.resolve(facet) {
            Some(path) => fetch(self.ctx.delegate.as_ref(), &path, fallback),
            None => Err(Degraded {
                reason: DegradedReason::Unresolved,
                fallback,
            }),
        }
    }

    /// Push every facet's grants again.
    pub fn push_permissions(&self) -> PushOutcome {
        push_all(self)
    }
}

/// Read access to one facet.
#[derive(Debug, Clone, Copy)]
pub struct FacetView<'a> {
    handle: &'a ObjectHandle,
    facet: Facet,
}

impl<'a> FacetView<'a> {
    pub fn facet(&self) -> Facet {
        self.facet
    }

    pub fn url(&self) -> Option<&'a SyftUrl> {
        self.handle.descriptor.location(self.facet)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.handle.resolve(self.facet)
    }

    pub fn read(&self) -> Option<&'a CapabilityList> {
        self.handle.descriptor.capabilities(self.facet, Access::Read)
    }

    /// `None` for the discovery facet, which only its owner writes.
    pub fn write(&self) -> Option<&'a CapabilityList> {
        self.handle.descriptor.capabilities(self.facet, Access::Write)
    }

    /// The mock note. Always `None` on other facets.
    pub fn note(&self) -> Option<&'a str> {
        if self.facet != Facet::Mock {
            return None;
        }
        self.handle
            .descriptor
            .metadata
            .get(MOCK_NOTE_KEY)
            .and_then(|v| v.as_str())
    }

    pub fn effective_permissions(&self) -> Result<PermissionSet, Degraded<PermissionSet>> {
        self.handle.effective_permissions(self.facet)
    }
}

/// Result of [`FacetEditor::move_to`].
#[derive(Debug)]
pub enum MoveOutcome {
    Moved {
        from: PathBuf,
        to: PathBuf,
        permissions: PushOutcome,
    },
    /// The current artifact does not resolve; nothing was changed.
    SourceMissing,
}

/// Result of [`FacetEditor::write_content`]. The bytes are on disk in both cases.
#[derive(Debug)]
pub enum ContentUpdate {
    Written { warnings: Vec<TypeWarning> },
    WrittenWithWarning(ValidationError),
}

/// Mutating access to one facet.
#[derive(Debug)]
pub struct FacetEditor<'a> {
    handle: &'a mut ObjectHandle,
    facet: Facet,
}

impl FacetEditor<'_> {
    pub fn view(&self) -> FacetView<'_> {
        self.handle.view(self.facet)
    }

    /// Replace the read list, persist, and push grants.
    pub fn set_read(&mut self, list: CapabilityList) -> Result<PushOutcome, StoreError> {
        self.set(Access::Read, list)
    }

    /// Replace the write list, persist, and push grants.
    ///
    /// # Errors
    ///
    /// The discovery facet has no write list: `SyoError::InvariantViolation`.
    pub fn set_write(&mut self, list: CapabilityList) -> Result<PushOutcome, StoreError> {
        self.set(Access::Write, list)
    }

    fn set(&mut self, access: Access, list: CapabilityList) -> Result<PushOutcome, StoreError> {
        self.handle.descriptor.set_capabilities(self.facet, access, list)?;
        self.handle.persist()?;
        Ok(push_facet(self.handle, self.facet))
    }

    /// Move the facet's artifact to `target`: a full `syft://` URL or a bare
    /// filename kept in the current directory. Discovery targets always get
    /// the sidecar suffix.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidRequest` for a bare filename on a facet without
    ///   a location, or a target that changes the file extension.
    /// - `StoreError::Io` if the move itself fails.
    pub fn move_to(&mut self, target: &str) -> Result<MoveOutcome, StoreError> {
        let facet = self.facet;
        let url = self.target_url(target)?;
        let Some(from) = self.handle.resolve(facet) else {
            return Ok(MoveOutcome::SourceMissing);
        };

        let to = match self.handle.ctx.client.to_local_path(&url) {
            Ok(Some(path)) => absolutize(&path, self.handle.ctx.resolver.cwd()),
            _ => from
                .parent()
                .map(|p| p.join(url.filename()))
                .unwrap_or_else(|| PathBuf::from(url.filename())),
        };

        let base = self.handle.resolver().base_dir(&self.handle.descriptor);
        let previous = self.handle.descriptor.clone();
        self.handle.descriptor.set_location(facet, url);
        if let Err(e) = self.handle.descriptor.check_invariants() {
            self.handle.descriptor = previous;
            return Err(StoreError::InvalidRequest(e.to_string()));
        }
        if let Err(e) = move_path(&from, &to) {
            self.handle.descriptor = previous;
            return Err(e.into());
        }

        if facet == Facet::Discovery {
            self.handle.sidecar = to.clone();
            let stored_relative = self
                .handle
                .descriptor
                .base_path
                .as_deref()
                .is_some_and(Path::is_relative);
            if let (true, Some(base), Some(dir)) = (stored_relative, &base, to.parent()) {
                self.handle.descriptor.base_path = Some(relative_path(dir, base));
            }
        }
        if let (Some(base), Some(_)) = (&base, self.handle.descriptor.relative(facet)) {
            self.handle
                .descriptor
                .set_relative(facet, Some(relative_path(base, &to)));
        }
        self.handle.descriptor.set_absolute_fallback(facet, Some(to.clone()));
        self.handle.persist()?;

        if let Err(e) = self.handle.ctx.delegate.remove(&from) {
            tracing::warn!(
                path = %from.display(),
                error = %e,
                "stale permission entry not cleared"
            );
        }
        let permissions = push_facet(self.handle, facet);
        tracing::info!(
            id = %self.handle.id(),
            facet = %facet,
            from = %from.display(),
            to = %to.display(),
            "artifact moved"
        );
        Ok(MoveOutcome::Moved {
            from,
            to,
            permissions,
        })
    }

    fn target_url(&self, target: &str) -> Result<SyftUrl, StoreError> {
        let facet = self.facet;
        let url = if target.starts_with(SCHEME) {
            let url = SyftUrl::parse(target)?;
            if facet == Facet::Discovery {
                url.with_filename(&with_sidecar_suffix(url.filename()))
            } else {
                url
            }
        } else {
            let current = self.handle.descriptor.location(facet).ok_or_else(|| {
                StoreError::InvalidRequest(format!("{facet} facet has no location to rename"))
            })?;
            let name = if facet == Facet::Discovery {
                with_sidecar_suffix(target)
            } else {
                target.to_string()
            };
            current.with_filename(&name)
        };
        Ok(if self.handle.descriptor.is_folder() && facet != Facet::Discovery {
            url.into_folder()
        } else {
            url
        })
    }

    /// Overwrite the facet's artifact, then validate the pair.
    ///
    /// The write is never undone: a mismatch comes back as
    /// [`ContentUpdate::WrittenWithWarning`].
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidRequest` for the discovery facet or a folder object.
    /// - `StoreError::Unresolved` if the artifact has no local path.
    pub fn write_content(&mut self, bytes: &[u8]) -> Result<ContentUpdate, StoreError> {
        let facet = self.facet;
        if facet == Facet::Discovery || self.handle.descriptor.is_folder() {
            return Err(StoreError::InvalidRequest(format!(
                "cannot write content to the {facet} facet of a {} object",
                self.handle.descriptor.kind
            )));
        }
        let path = match self.handle.resolve(facet) {
            Some(path) => path,
            None => self
                .handle
                .descriptor
                .location(facet)
                .and_then(|url| self.handle.ctx.client.to_local_path(url).ok().flatten())
                .ok_or_else(|| StoreError::Unresolved {
                    facet,
                    id: self.handle.id().to_string(),
                })?,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        self.handle.persist()?;

        match self.handle.validate(false) {
            Ok(report) => Ok(ContentUpdate::Written {
                warnings: report.warnings,
            }),
            Err(StoreError::Validation(e)) => {
                tracing::warn!(
                    id = %self.handle.id(),
                    facet = %facet,
                    error = %e,
                    "content written but mock and private no longer match"
                );
                Ok(ContentUpdate::WrittenWithWarning(e))
            }
            Err(StoreError::Unresolved { .. }) => Ok(ContentUpdate::Written {
                warnings: Vec::new(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Set or clear the mock note.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRequest` on facets other than mock.
    pub fn set_note(&mut self, note: Option<String>) -> Result<(), StoreError> {
        if self.facet != Facet::Mock {
            return Err(StoreError::InvalidRequest(format!(
                "the {} facet has no note",
                self.facet
            )));
        }
        match note {
            Some(note) => {
                self.handle
                    .descriptor
                    .metadata
                    .insert(MOCK_NOTE_KEY.to_string(), serde_json::Value::String(note));
            }
            None => {
                self.handle.descriptor.metadata.remove(MOCK_NOTE_KEY);
            }
        }
        self.handle.persist()
    }
}
