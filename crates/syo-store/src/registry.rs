//! # Registry
//!
//! The explicitly constructed entry point of the store. A registry owns the
//! shared [`StoreContext`] (configuration, addressing client, permission
//! delegate, resolver, validator) and the current [`Collection`] snapshot.
//! Construct one per process, or per test, and pass it to whatever needs
//! it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use syo_core::{sidecar, Facet};
use syo_resolve::paths::absolutize;
use syo_resolve::{AddressingClient, DatasitesClient, PathResolver};
use syo_validate::CompatibilityValidator;

use crate::collection::{Collection, CollectionEntry};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::factory::{self, CreateOutcome, CreateRequest};
use crate::fsops::remove_path;
use crate::object::ObjectHandle;
use crate::permission::{fetch, value_of, PermissionDelegate, PermissionSet, SyftPubDelegate};

/// Collaborators shared by the registry and every handle it hands out.
pub struct StoreContext {
    pub config: StoreConfig,
    pub client: Arc<dyn AddressingClient>,
    pub delegate: Arc<dyn PermissionDelegate>,
    pub resolver: PathResolver,
    pub validator: CompatibilityValidator,
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("config", &self.config)
            .field("client", &self.client.client_name())
            .field("delegate", &self.delegate.delegate_name())
            .field("resolver", &self.resolver)
            .finish()
    }
}

/// Restricts [`Registry::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    Search(String),
    Owner(String),
}

/// Result of one deletion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Removed,
    /// Nothing to remove: the artifact did not resolve.
    Absent,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What [`Registry::delete`] did, step by step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: String,
    pub mock: StepOutcome,
    pub private: StepOutcome,
    pub sidecar: StepOutcome,
}

impl DeleteOutcome {
    /// True when no step failed.
    pub fn is_complete(&self) -> bool {
        ![&self.mock, &self.private, &self.sidecar]
            .iter()
            .any(|s| s.is_failed())
    }
}

/// Explicitly constructed object registry.
#[derive(Debug)]
pub struct Registry {
    ctx: Arc<StoreContext>,
    collection: Collection,
}

impl Registry {
    /// A registry over the given collaborators. The collection starts empty;
    /// call [`Registry::refresh`] to scan.
    pub fn new(
        config: StoreConfig,
        client: Arc<dyn AddressingClient>,
        delegate: Arc<dyn PermissionDelegate>,
    ) -> Self {
        let resolver = PathResolver::new(Arc::clone(&client), &config.cwd)
            .with_staging_dir(&config.staging_dir)
            .with_search_depth(config.search_depth);
        Self {
            ctx: Arc::new(StoreContext {
                config,
                client,
                delegate,
                resolver,
                validator: CompatibilityValidator::default(),
            }),
            collection: Collection::new(),
        }
    }

    /// A registry over the local datasites mount with `syft.pub.yaml` permissions.
    pub fn from_config(config: StoreConfig) -> Self {
        let client = Arc::new(DatasitesClient::new(&config.datasites));
        Self::new(config, client, Arc::new(SyftPubDelegate::new()))
    }

    pub fn context(&self) -> &Arc<StoreContext> {
        &self.ctx
    }

    pub fn config(&self) -> &StoreConfig {
        &self.ctx.config
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Rescan and replace the collection snapshot.
    pub fn refresh(&mut self) -> usize {
        self.collection.refresh(
            self.ctx.client.as_ref(),
            self.ctx.delegate.as_ref(),
            self.ctx.config.viewer.as_deref(),
        )
    }

    /// Create an object and refresh the collection.
    ///
    /// # Errors
    ///
    /// See [`crate::factory`]. A `StoreError::Validation` is returned after
    /// the artifacts and sidecar were written.
    pub fn create(&mut self, request: CreateRequest) -> Result<CreateOutcome, StoreError> {
        let result = factory::create(&self.ctx, request);
        self.refresh();
        result
    }

    /// The current snapshot, optionally filtered.
    pub fn list(&self, filter: Option<&ListFilter>) -> Collection {
        match filter {
            None => self.collection.clone(),
            Some(ListFilter::Search(term)) => self.collection.search(term),
            Some(ListFilter::Owner(pattern)) => self.collection.filter_by_owner(pattern),
        }
    }

    /// Object by id. A miss triggers one refresh before giving up.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::NotFound` if the id is absent after refresh.
    pub fn get(&mut self, id: &str) -> Result<ObjectHandle, StoreError> {
        if let Ok(entry) = self.collection.get_id(id) {
            return Ok(self.handle(entry));
        }
        self.refresh();
        let entry = self.collection.get_id(id)?;
        Ok(self.handle(entry))
    }

    /// Object at `index` in the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::IndexOutOfRange` outside `-len..len`.
    pub fn get_index(&self, index: isize) -> Result<ObjectHandle, StoreError> {
        let entry = self.collection.get_index(index)?;
        Ok(self.handle(entry))
    }

    /// Load an object straight from a sidecar file.
    ///
    /// # Errors
    ///
    /// Returns `SyoError::InvalidSidecarName` or `MalformedSidecar`.
    pub fn open(&self, path: &Path) -> Result<ObjectHandle, StoreError> {
        let path = absolutize(path, &self.ctx.config.cwd);
        let descriptor = sidecar::load(&path)?;
        Ok(ObjectHandle::new(descriptor, path, Arc::clone(&self.ctx)))
    }

    fn handle(&self, entry: &CollectionEntry) -> ObjectHandle {
        ObjectHandle::new(
            entry.descriptor.clone(),
            entry.sidecar.clone(),
            Arc::clone(&self.ctx),
        )
    }

    /// Delete an object: mock, then private, then the sidecar.
    ///
    /// Only the owner, or a principal on the sidecar's admin list, may
    /// delete. Each step is best-effort; failures are reported in the
    /// outcome rather than aborting the remaining steps.
    ///
    /// # Errors
    ///
    /// - `CollectionError::NotFound` if the id is unknown.
    /// - `StoreError::PermissionDenied` if `requester` may not delete.
    pub fn delete(&mut self, id: &str, requester: &str) -> Result<DeleteOutcome, StoreError> {
        let handle = self.get(id)?;
        let descriptor = handle.descriptor();
        if descriptor.owner() != requester {
            let fallback = PermissionSet::from_descriptor(descriptor, Facet::Discovery);
            let grants = value_of(fetch(
                self.ctx.delegate.as_ref(),
                handle.sidecar_path(),
                fallback,
            ));
            if !grants.admin.contains(requester) {
                return Err(StoreError::PermissionDenied {
                    principal: requester.to_string(),
                    id: id.to_string(),
                });
            }
        }

        let mock = self.remove_facet(&handle, Facet::Mock);
        let private = self.remove_facet(&handle, Facet::Private);
        let sidecar = self.remove_step(handle.sidecar_path());

        let outcome = DeleteOutcome {
            id: id.to_string(),
            mock,
            private,
            sidecar,
        };
        if outcome.is_complete() {
            tracing::info!(id, "object deleted");
        } else {
            tracing::warn!(id, ?outcome, "object partially deleted");
        }
        self.refresh();
        Ok(outcome)
    }

    fn remove_facet(&self, handle: &ObjectHandle, facet: Facet) -> StepOutcome {
        match handle.resolve(facet) {
            Some(path) => self.remove_step(&path),
            None => StepOutcome::Absent,
        }
    }

    fn remove_step(&self, path: &Path) -> StepOutcome {
        if let Err(e) = self.ctx.delegate.remove(path) {
            tracing::warn!(
                delegate = self.ctx.delegate.delegate_name(),
                path = %path.display(),
                error = %e,
                "permission entry not cleared"
            );
        }
        match remove_path(path) {
            Ok(true) => StepOutcome::Removed,
            Ok(false) => StepOutcome::Absent,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}
