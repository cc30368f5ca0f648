//! # Store Errors
//!
//! `StoreError` is what every registry, factory, and facade operation
//! returns. Resolution absence never appears here as a failure of its own;
//! it only becomes an error when an operation cannot proceed without the
//! artifact (`Unresolved`).
//!
//! Permission backend trouble is not an error at all: see
//! [`crate::permission::Degraded`].

use std::path::PathBuf;

use syo_core::{Facet, SyoError};
use syo_validate::ValidationError;
use thiserror::Error;

/// Positional and keyed lookup failures on a collection snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// No descriptor with this id in the current snapshot.
    #[error("object not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// Index outside `-len..len`.
    #[error("index {index} out of range for collection of {len}")]
    IndexOutOfRange {
        /// The requested index, possibly negative.
        index: isize,
        /// Snapshot length at lookup time.
        len: usize,
    },
}

/// Top-level error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Descriptor load, save, or invariant failure.
    #[error(transparent)]
    Core(#[from] SyoError),

    /// Mock and private artifacts are not compatible.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup in the collection failed.
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// A caller-supplied source file or folder does not exist.
    #[error("content not found: {}", path.display())]
    ContentNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An operation needs a facet's artifact, and it does not resolve locally.
    #[error("{facet} artifact of {id} cannot be resolved locally")]
    Unresolved {
        /// The facet that did not resolve.
        facet: Facet,
        /// The object id.
        id: String,
    },

    /// The requester is neither the owner nor an admin.
    #[error("{principal} may not modify {id}")]
    PermissionDenied {
        /// Who asked.
        principal: String,
        /// The object id.
        id: String,
    },

    /// The request is inconsistent with itself or with the object.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// IO error while staging, placing, or removing artifacts.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
