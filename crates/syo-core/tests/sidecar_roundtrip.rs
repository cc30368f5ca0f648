//! # Sidecar Round-Trip Tests
//!
//! `load(save(d))` must reproduce every field of `d`. Timestamps written
//! without an explicit zone by other producers gain a `Z` on resave, and
//! nothing else about the document may drift.

use std::collections::BTreeMap;
use std::fs;

use chrono::DateTime;
use proptest::prelude::*;
use syo_core::descriptor::ObjectKind;
use syo_core::sidecar::{self, sidecar_path};
use syo_core::{CapabilityList, Descriptor, ObjectId, SyftUrl, Timestamp, Visibility};

fn timestamp() -> impl Strategy<Value = Timestamp> {
    (0i64..4_000_000_000, 0u32..1_000_000).prop_map(|(secs, micros)| {
        let dt = DateTime::from_timestamp(secs, micros * 1_000).unwrap();
        Timestamp::from_utc(dt)
    })
}

fn principal() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("public".to_string()),
        "[a-z]{1,8}@example\\.com".prop_map(String::from),
    ]
}

fn capability_list() -> impl Strategy<Value = CapabilityList> {
    prop::collection::vec(principal(), 0..4).prop_map(CapabilityList::from)
}

fn metadata() -> impl Strategy<Value = BTreeMap<String, serde_json::Value>> {
    let value = prop_oneof![
        any::<i64>().prop_map(|n| serde_json::json!(n)),
        any::<bool>().prop_map(serde_json::Value::Bool),
        "v_[a-z0-9]{0,10}".prop_map(serde_json::Value::String),
    ];
    prop::collection::btree_map("_?k[a-z]{0,8}", value, 0..5)
}

fn descriptor() -> impl Strategy<Value = Descriptor> {
    (
        "[a-z]{1,8}@example\\.com",
        "f_[a-z0-9]{1,10}",
        prop::option::of("n_[A-Za-z0-9]{0,12}"),
        prop::option::of(timestamp()),
        prop::option::of(timestamp()),
        prop::option::of("/base/[a-z]{1,6}"),
        (capability_list(), capability_list(), capability_list()),
        metadata(),
        any::<bool>(),
    )
        .prop_map(
            |(owner, stem, name, created, updated, base, (read, mock_read, write), meta, folder)| {
                let kind = if folder { ObjectKind::Folder } else { ObjectKind::File };
                let mut d = Descriptor::new(ObjectId::new(), kind);
                let (private, mock) = if folder {
                    (
                        SyftUrl::folder(&owner, Visibility::Private, &stem),
                        SyftUrl::folder(&owner, Visibility::Public, &format!("{stem}_mock")),
                    )
                } else {
                    (
                        SyftUrl::object(&owner, Visibility::Private, &format!("{stem}.csv")),
                        SyftUrl::object(&owner, Visibility::Public, &format!("{stem}_mock.csv")),
                    )
                };
                d.private_location = Some(private);
                d.mock_location = Some(mock);
                d.discovery_location = Some(SyftUrl::object(
                    &owner,
                    Visibility::Public,
                    &format!("{stem}.syftobject.yaml"),
                ));
                d.name = name;
                d.created_at = created;
                d.updated_at = updated;
                d.base_path = base.map(Into::into);
                if d.base_path.is_some() {
                    d.private_location_relative = Some(format!("data/{stem}.csv").into());
                }
                d.private_read = read;
                d.mock_read = mock_read;
                d.private_write = write;
                d.metadata = meta;
                d
            },
        )
}

proptest! {
    /// Saving then loading reproduces the descriptor exactly.
    #[test]
    fn test_load_save_roundtrip(d in descriptor()) {
        let dir = tempfile::tempdir().unwrap();
        let path = sidecar_path(dir.path(), "obj");
        sidecar::save(&d, &path).unwrap();
        let loaded = sidecar::load(&path).unwrap();
        prop_assert_eq!(loaded, d);
    }
}

#[test]
fn test_naive_timestamps_gain_zone_on_resave() {
    let dir = tempfile::tempdir().unwrap();
    let path = sidecar_path(dir.path(), "legacy");
    fs::write(
        &path,
        "id: legacy-1\n\
         createdAt: '2025-05-01T10:00:00.123456'\n\
         privateLocation: syft://a@b.c/private/objects/x.txt\n",
    )
    .unwrap();

    let loaded = sidecar::load(&path).unwrap();
    sidecar::save(&loaded, &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("2025-05-01T10:00:00.123456Z"));
    assert_eq!(sidecar::load(&path).unwrap(), loaded);
}

#[test]
fn test_capability_order_survives_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = sidecar_path(dir.path(), "order");
    let mut d = Descriptor::new(ObjectId::new(), ObjectKind::File);
    d.private_read = ["zed@example.com", "amy@example.com"].into_iter().collect();
    sidecar::save(&d, &path).unwrap();
    let loaded = sidecar::load(&path).unwrap();
    assert_eq!(
        loaded.private_read.to_vec(),
        vec!["zed@example.com".to_string(), "amy@example.com".to_string()]
    );
}

#[test]
fn test_scan_style_load_of_non_descriptor_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = sidecar_path(dir.path(), "junk");
    fs::write(&path, "just: a map\n").unwrap();
    assert!(sidecar::load(&path).is_err());
}
