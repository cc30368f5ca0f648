//! # syo-resolve — Locating Artifacts
//!
//! Maps a descriptor facet (private, mock, discovery) to a path on this
//! machine. Nothing here is fatal: an artifact that has not synced yet, or
//! was moved somewhere the resolver cannot see, is reported as `None`.
//!
//! - [`client`]: the boundary to the addressing transport, plus a
//!   datasites-directory implementation.
//! - [`resolver`]: the four-strategy [`PathResolver`] and
//!   [`PathResolver::update_relative_paths`].
//! - [`paths`]: lexical normalisation and relative-path helpers.

pub mod client;
pub mod paths;
pub mod resolver;

pub use client::{AddressingClient, AddressingError, DatasitesClient};
pub use resolver::{PathResolver, Resolution, Strategy, DEFAULT_SEARCH_DEPTH, DEFAULT_STAGING_DIR};
