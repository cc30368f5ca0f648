//! # syo-store — Registry, Factory, and Collection
//!
//! The stateful layer of syft-objects. Everything here works through an
//! explicitly constructed [`Registry`]: there is no process-wide state.
//!
//! ## Modules
//!
//! - [`registry`]: the registry and its shared [`StoreContext`], listing,
//!   lookup, and deletion with a per-step outcome.
//! - [`factory`]: object creation from inline bytes, files, or folders.
//! - [`object`]: [`ObjectHandle`] and its per-facet accessors.
//! - [`collection`]: the creation-ordered snapshot with indexed, keyed,
//!   and filtered views.
//! - [`permission`]: the permission delegate boundary and its degraded
//!   results.
//! - [`config`]: [`StoreConfig`] and environment loading.
//!
//! ## Crate Policy
//!
//! - Resolution absence is never an error here unless an operation cannot
//!   proceed without the artifact.
//! - Permission backend failures never fail an operation; they surface as
//!   [`permission::Degraded`].
//! - Sidecar writes happen before validation and permission pushes. There
//!   is no rollback.

pub mod collection;
pub mod config;
pub mod discovery;
pub mod error;
pub mod factory;
pub mod fsops;
pub mod object;
pub mod permission;
pub mod registry;

pub use collection::{Collection, CollectionEntry, Provenance};
pub use config::{ConfigError, StoreConfig};
pub use error::{CollectionError, StoreError};
pub use factory::{ContentSource, CreateOutcome, CreateRequest};
pub use object::{ContentUpdate, FacetEditor, FacetView, MoveOutcome, ObjectHandle, ObjectInfo};
pub use permission::{
    Degraded, DegradedReason, InMemoryDelegate, PermissionDelegate, PermissionError, PermissionSet,
    PushOutcome, SyftPubDelegate,
};
pub use registry::{DeleteOutcome, ListFilter, Registry, StepOutcome, StoreContext};
