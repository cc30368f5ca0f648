//! # Error Types
//!
//! Errors raised while constructing, loading, or persisting descriptors.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Load errors carry the offending path so bulk scans can report and skip.
//! - Location errors carry the URL that failed to parse or normalise.
//! - Resolution absence is never an error; see `syo-resolve`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for descriptor handling.
#[derive(Error, Debug)]
pub enum SyoError {
    /// A sidecar path does not carry the `.syftobject.yaml` double suffix.
    #[error("sidecar file must end with .syftobject.yaml, got: {}", path.display())]
    InvalidSidecarName {
        /// The rejected path.
        path: PathBuf,
    },

    /// A sidecar file exists but does not parse as a descriptor.
    #[error("malformed sidecar {}: {reason}", path.display())]
    MalformedSidecar {
        /// Path to the sidecar.
        path: PathBuf,
        /// Parser or invariant failure.
        reason: String,
    },

    /// A location is not a well-formed `syft://` URL for its object kind.
    #[error("invalid location {url:?}: {reason}")]
    InvalidLocation {
        /// The offending URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A descriptor invariant does not hold.
    #[error("descriptor invariant violated: {0}")]
    InvariantViolation(String),

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
