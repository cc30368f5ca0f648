//! # syo-cli — Command-Line Front-End
//!
//! Thin handlers over [`syo_store::Registry`]. Each subcommand module
//! exposes an `Args` struct and a `run_*` function returning the process
//! exit code.
//!
//! ## Exit codes
//!
//! - `0`: success.
//! - `1`: the object was found but failed a check (validation mismatch,
//!   unresolved artifact, partial delete), or a lookup missed.
//! - `2`: operational error (configuration, IO, malformed sidecar).
//!
//! ```bash
//! syo list --search census
//! syo show 0
//! syo create --name "Sales" --private sales.csv --mock sales_mock.csv
//! syo validate 3f2a9c1e-...
//! syo delete -1
//! ```

pub mod create;
pub mod inspect;
pub mod objects;

use std::path::Path;

use anyhow::Result;
use syo_core::sidecar::is_sidecar_path;
use syo_store::{ObjectHandle, Registry, StoreError};

/// Exit code for a failed check or missed lookup.
pub const EXIT_CHECK_FAILED: u8 = 1;

/// Exit code for an operational error.
pub const EXIT_ERROR: u8 = 2;

/// Look an object up by sidecar path, collection index, or id.
///
/// Index lookups refresh first so the position is read against a fresh
/// snapshot.
pub fn lookup(registry: &mut Registry, target: &str) -> Result<ObjectHandle, StoreError> {
    if is_sidecar_path(Path::new(target)) {
        return registry.open(Path::new(target));
    }
    if let Ok(index) = target.parse::<isize>() {
        registry.refresh();
        return registry.get_index(index);
    }
    registry.get(target)
}

/// Map a store error onto an exit code.
pub fn exit_code_for(error: &StoreError) -> u8 {
    match error {
        StoreError::Validation(_)
        | StoreError::Collection(_)
        | StoreError::Unresolved { .. }
        | StoreError::PermissionDenied { .. } => EXIT_CHECK_FAILED,
        _ => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syo_core::Facet;
    use syo_store::CollectionError;

    #[test]
    fn test_exit_codes() {
        let missing = StoreError::Collection(CollectionError::NotFound { id: "x".into() });
        assert_eq!(exit_code_for(&missing), EXIT_CHECK_FAILED);
        let unresolved = StoreError::Unresolved {
            facet: Facet::Mock,
            id: "x".into(),
        };
        assert_eq!(exit_code_for(&unresolved), EXIT_CHECK_FAILED);
        let io = StoreError::Io(std::io::Error::other("disk"));
        assert_eq!(exit_code_for(&io), EXIT_ERROR);
    }
}
