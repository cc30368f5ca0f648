//! # syo-core — Foundational Types for syft-objects
//!
//! Defines the record that makes an object addressable: a [`Descriptor`]
//! pairing a private artifact with a structurally equivalent mock, each named
//! by a stable `syft://` URL rather than a filesystem path. Every other
//! `syo-*` crate depends on this one; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers and instants.** `ObjectId`, `Timestamp`, and
//!    `SyftUrl` are never passed around as bare strings.
//!
//! 2. **The descriptor is pure data.** Resolution, validation, and
//!    persistence policy live in `syo-resolve`, `syo-validate`, and
//!    `syo-store`. This crate only loads, saves, and checks invariants.
//!
//! 3. **Field names are a wire contract.** The sidecar YAML is read by other
//!    producers. Renames go through serde aliases, never through new names.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `syo-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod capability;
pub mod descriptor;
pub mod error;
pub mod identity;
pub mod sidecar;
pub mod temporal;
pub mod url;

pub use capability::{CapabilityList, PUBLIC};
pub use descriptor::{
    is_reserved_key, Access, Descriptor, Facet, ObjectKind, FILE_OPERATIONS_KEY, MOCK_NOTE_KEY,
};
pub use error::SyoError;
pub use identity::ObjectId;
pub use sidecar::SIDECAR_SUFFIX;
pub use temporal::Timestamp;
pub use url::{SyftUrl, Visibility};
