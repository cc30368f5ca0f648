//! # CLI Handlers
//!
//! Drives the subcommand handlers against a temporary datasites tree and
//! checks the exit codes they return.

use std::fs;
use std::sync::Arc;

use syo_cli::create::{run_create, CreateArgs};
use syo_cli::inspect::{
    run_relink, run_resolve, run_validate, RelinkArgs, ResolveArgs, ValidateArgs,
};
use syo_cli::objects::{run_delete, run_show, DeleteArgs, ShowArgs};
use syo_cli::{EXIT_CHECK_FAILED, EXIT_ERROR};
use syo_resolve::DatasitesClient;
use syo_store::{InMemoryDelegate, Registry, StoreConfig};

const OWNER: &str = "alice@example.com";

fn registry(dir: &std::path::Path) -> Registry {
    let root = dir.join("datasites");
    let work = dir.join("work");
    fs::create_dir_all(root.join(OWNER)).unwrap();
    fs::create_dir_all(&work).unwrap();
    Registry::new(
        StoreConfig::new(OWNER, &root, &work),
        Arc::new(DatasitesClient::new(&root)),
        Arc::new(InMemoryDelegate::new()),
    )
}

fn create_args(private: &str, mock: &str) -> CreateArgs {
    CreateArgs {
        name: Some("Survey".into()),
        description: None,
        private: None,
        private_text: Some(private.into()),
        mock: None,
        mock_text: Some(mock.into()),
        extension: Some("csv".into()),
        mock_note: None,
        mock_read: None,
        private_read: None,
        discovery_read: None,
        metadata: vec![],
        skip_validation: false,
        reference_only: false,
        base_path: None,
        relative: false,
        save_to: None,
    }
}

#[test]
fn test_create_show_validate_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());

    assert_eq!(run_create(&create_args("id,v\n1,2\n", "id,v\n0,0\n"), &mut registry).unwrap(), 0);
    let id = registry.collection().get_index(0).unwrap().descriptor.id().to_string();

    let show = ShowArgs {
        target: "0".into(),
        json: true,
    };
    assert_eq!(run_show(&show, &mut registry).unwrap(), 0);

    let validate = ValidateArgs {
        target: Some(id.clone()),
        pair: None,
    };
    assert_eq!(run_validate(&validate, &mut registry).unwrap(), 0);

    let resolve = ResolveArgs {
        target: id.clone(),
        facet: None,
    };
    assert_eq!(run_resolve(&resolve, &mut registry).unwrap(), 0);

    let delete = DeleteArgs {
        target: id.clone(),
        requester: Some("mallory@example.com".into()),
    };
    assert_eq!(run_delete(&delete, &mut registry).unwrap(), EXIT_CHECK_FAILED);

    let delete = DeleteArgs {
        target: id,
        requester: None,
    };
    assert_eq!(run_delete(&delete, &mut registry).unwrap(), 0);
    assert!(registry.collection().is_empty());
}

#[test]
fn test_create_mismatch_exits_with_check_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());
    let code = run_create(&create_args("id,secret\n1,2\n", "id\n0\n"), &mut registry).unwrap();
    assert_eq!(code, EXIT_CHECK_FAILED);
}

#[test]
fn test_validate_pair_of_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());
    let mock = dir.path().join("mock.csv");
    let private = dir.path().join("private.csv");
    fs::write(&mock, "a,b\n0,0\n").unwrap();
    fs::write(&private, "a,b\n1,2\n").unwrap();

    let args = ValidateArgs {
        target: None,
        pair: Some(vec![mock.clone(), private.clone()]),
    };
    assert_eq!(run_validate(&args, &mut registry).unwrap(), 0);

    fs::write(&private, "a,c\n1,2\n").unwrap();
    assert_eq!(run_validate(&args, &mut registry).unwrap(), EXIT_CHECK_FAILED);
}

#[test]
fn test_unknown_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = registry(dir.path());
    let show = ShowArgs {
        target: "no-such-object".into(),
        json: false,
    };
    assert_eq!(run_show(&show, &mut registry).unwrap(), EXIT_CHECK_FAILED);

    let relink = RelinkArgs {
        target: dir.path().join("missing.syftobject.yaml").display().to_string(),
    };
    assert_eq!(run_relink(&relink, &mut registry).unwrap(), EXIT_ERROR);
}
