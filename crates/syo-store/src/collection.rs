//! # Collection
//!
//! Snapshot of every reachable descriptor, ordered by creation time, with
//! positional, keyed, and filtered views.
//!
//! ## Invariants
//!
//! - Within one snapshot, entry `i` was created no later than entry `i + 1`.
//!   A missing `createdAt` sorts as the earliest instant. Ties keep scan
//!   order (owner, then visibility, then sidecar filename).
//! - [`Collection::refresh`] builds a fresh list and swaps it in whole; no
//!   entry from the previous snapshot survives unless it was rediscovered.
//! - Views (`slice`, `search`, `filter_by_owner`, `get_by_indices`) are new
//!   collections carrying a [`Provenance`]; they never mutate their source.
//!
//! Index positions are only meaningful against the snapshot they were read
//! from. Negative indices count from the end and are logged at warn level,
//! since a concurrent create or delete shifts what they point at.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::path::PathBuf;

use syo_core::{sidecar, Descriptor, Facet, SyftUrl, Visibility};
use syo_resolve::AddressingClient;

use crate::discovery::sidecars_in;
use crate::error::CollectionError;
use crate::permission::{fetch, value_of, PermissionDelegate, PermissionSet};

/// One discovered descriptor and the sidecar it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub descriptor: Descriptor,
    pub sidecar: PathBuf,
}

/// How a collection view was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// A full refresh.
    All,
    /// Result of [`Collection::search`].
    Search(String),
    /// Result of [`Collection::filter_by_owner`].
    Owner(String),
    /// A positional slice of another view.
    Slice {
        parent: Box<Provenance>,
        start: usize,
        end: usize,
    },
    /// Result of [`Collection::get_by_indices`].
    Indices,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All objects"),
            Self::Search(term) => write!(f, "Search results for '{term}'"),
            Self::Owner(pattern) => write!(f, "Filtered by owner containing '{pattern}'"),
            Self::Slice { parent, start, end } => write!(f, "{parent} (slice {start}:{end})"),
            Self::Indices => f.write_str("Selected indices"),
        }
    }
}

/// An ordered snapshot of descriptors.
#[derive(Debug, Clone)]
pub struct Collection {
    entries: Vec<CollectionEntry>,
    provenance: Provenance,
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Collection {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            provenance: Provenance::All,
        }
    }

    /// A snapshot of `entries`, sorted into creation order.
    pub fn from_entries(entries: Vec<CollectionEntry>) -> Self {
        let mut collection = Self {
            entries,
            provenance: Provenance::All,
        };
        collection.sort();
        collection
    }

    fn view(&self, entries: Vec<CollectionEntry>, provenance: Provenance) -> Self {
        Self { entries, provenance }
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.descriptor.created_or_min());
    }

    /// Rescan every known owner's `public/objects` and `private/objects`
    /// directories and replace the snapshot.
    ///
    /// Malformed sidecars are skipped with a warning. When `viewer` is set,
    /// only descriptors the viewer may discover are kept; the delegate is
    /// asked first and the descriptor's `discoveryRead` list is the degraded
    /// fallback. If owners cannot be enumerated the previous snapshot is
    /// kept. Returns the number of entries in the snapshot.
    pub fn refresh(
        &mut self,
        client: &dyn AddressingClient,
        delegate: &dyn PermissionDelegate,
        viewer: Option<&str>,
    ) -> usize {
        let owners = match client.list_known_owners() {
            Ok(owners) => owners,
            Err(e) => {
                tracing::warn!(
                    client = client.client_name(),
                    error = %e,
                    "cannot enumerate owners; keeping previous snapshot"
                );
                return self.entries.len();
            }
        };

        let mut entries = Vec::new();
        for owner in &owners {
            for visibility in Visibility::ALL {
                let url = SyftUrl::objects_dir(owner, visibility);
                let dir = match client.to_local_path(&url) {
                    Ok(Some(dir)) => dir,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::debug!(url = %url, error = %e, "objects directory not mapped");
                        continue;
                    }
                };
                for path in sidecars_in(&dir) {
                    match sidecar::load(&path) {
                        Ok(descriptor) => {
                            let hidden = viewer
                                .is_some_and(|v| !discoverable(delegate, &descriptor, &path, v));
                            if hidden {
                                continue;
                            }
                            entries.push(CollectionEntry {
                                descriptor,
                                sidecar: path,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %path.display(),
                                error = %e,
                                "skipping malformed sidecar"
                            );
                        }
                    }
                }
            }
        }

        let mut fresh = Self::from_entries(entries);
        std::mem::swap(self, &mut fresh);
        tracing::debug!(
            owners = owners.len(),
            objects = self.entries.len(),
            "collection refreshed"
        );
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<CollectionEntry> {
        self.entries.clone()
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Entry at `index`; negative values count from the end.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::IndexOutOfRange` outside `-len..len`.
    pub fn get_index(&self, index: isize) -> Result<&CollectionEntry, CollectionError> {
        let len = self.entries.len();
        let position = if index < 0 {
            tracing::warn!(
                index,
                len,
                "negative index depends on the current snapshot; concurrent writes shift its target"
            );
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        position
            .and_then(|i| self.entries.get(i))
            .ok_or(CollectionError::IndexOutOfRange { index, len })
    }

    /// Entry with the exact id.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::NotFound` if no entry has this id.
    pub fn get_id(&self, id: &str) -> Result<&CollectionEntry, CollectionError> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id().as_str() == id)
            .ok_or_else(|| CollectionError::NotFound { id: id.to_string() })
    }

    /// Entries in `range`, clamped to the snapshot.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let len = self.entries.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);
        self.view(
            self.entries[start..end].to_vec(),
            Provenance::Slice {
                parent: Box::new(self.provenance.clone()),
                start,
                end,
            },
        )
    }

    /// Case-insensitive substring search over name, owner, description,
    /// timestamps, and non-reserved metadata values.
    pub fn search(&self, term: &str) -> Self {
        let needle = term.to_lowercase();
        let entries = self
            .entries
            .iter()
            .filter(|e| {
                searchable_text(&e.descriptor)
                    .iter()
                    .any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        self.view(entries, Provenance::Search(term.to_string()))
    }

    /// Entries whose owner contains `pattern`, case-insensitively.
    pub fn filter_by_owner(&self, pattern: &str) -> Self {
        let needle = pattern.to_lowercase();
        let entries = self
            .entries
            .iter()
            .filter(|e| e.descriptor.owner().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        self.view(entries, Provenance::Owner(pattern.to_string()))
    }

    /// Entries at the given positions, in the order given. Out-of-range
    /// positions are skipped.
    pub fn get_by_indices(&self, indices: &[usize]) -> Self {
        let entries = indices
            .iter()
            .filter_map(|&i| self.entries.get(i))
            .cloned()
            .collect();
        self.view(entries, Provenance::Indices)
    }

    pub fn list_unique_owners(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.descriptor.owner().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn list_unique_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.descriptor.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn discoverable(
    delegate: &dyn PermissionDelegate,
    descriptor: &Descriptor,
    sidecar: &std::path::Path,
    viewer: &str,
) -> bool {
    if descriptor.owner() == viewer {
        return true;
    }
    let fallback = PermissionSet::from_descriptor(descriptor, Facet::Discovery);
    value_of(fetch(delegate, sidecar, fallback)).read.allows(viewer)
}

fn searchable_text(descriptor: &Descriptor) -> Vec<String> {
    let mut text = vec![descriptor.owner().to_string()];
    text.extend(descriptor.name.clone());
    text.extend(descriptor.description.clone());
    for ts in [descriptor.created_at, descriptor.updated_at].into_iter().flatten() {
        text.push(ts.to_search_string());
        text.push(ts.to_rfc3339());
    }
    for value in descriptor.editable_metadata().values() {
        match value {
            serde_json::Value::String(s) => text.push(s.clone()),
            other => text.push(other.to_string()),
        }
    }
    text
}

const HEADERS: [&str; 5] = ["Index", "Owner", "Object Name", "Private URL", "Mock URL"];

impl fmt::Display for Collection {
    /// Renders a plain-text table.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("No syft objects available");
        }
        let rows: Vec<[String; 5]> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let d = &e.descriptor;
                [
                    i.to_string(),
                    d.owner().to_string(),
                    d.name.clone().unwrap_or_else(|| "Unnamed Object".to_string()),
                    d.private_location.as_ref().map(ToString::to_string).unwrap_or_default(),
                    d.mock_location.as_ref().map(ToString::to_string).unwrap_or_default(),
                ]
            })
            .collect();
        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        if self.provenance != Provenance::All {
            writeln!(f, "{}", self.provenance)?;
        }
        let line = |f: &mut fmt::Formatter<'_>, cells: &[&str]| -> fmt::Result {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}"))
                .collect();
            writeln!(f, "{}", padded.join(" | ").trim_end())
        };
        line(f, &HEADERS)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            line(f, &cells)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use syo_core::{ObjectId, ObjectKind, Timestamp};

    fn entry(owner: &str, name: &str, secs: Option<i64>) -> CollectionEntry {
        let mut d = Descriptor::new(ObjectId::new(), ObjectKind::File);
        d.name = Some(name.to_string());
        let filename = format!("{name}.txt");
        d.private_location = Some(SyftUrl::object(owner, Visibility::Private, &filename));
        d.created_at = secs.map(|s| Timestamp::from_utc(Utc.timestamp_opt(s, 0).unwrap()));
        CollectionEntry {
            descriptor: d,
            sidecar: PathBuf::from(format!("/s/{name}.syftobject.yaml")),
        }
    }

    fn numbered(n: i64) -> Collection {
        let entries = (0..n).map(|i| entry("a@x.y", &format!("n{i}"), Some(i)));
        Collection::from_entries(entries.collect())
    }

    fn two() -> Collection {
        Collection::from_entries(vec![entry("a@x.y", "t0", Some(0)), entry("a@x.y", "t1", Some(1))])
    }

    fn names(c: &Collection) -> Vec<String> {
        c.iter().filter_map(|e| e.descriptor.name.clone()).collect()
    }

    #[test]
    fn test_orders_by_creation_with_missing_first() {
        let c = Collection::from_entries(vec![
            entry("a@x.y", "t0", Some(0)),
            entry("a@x.y", "t2", Some(2)),
            entry("a@x.y", "none", None),
            entry("a@x.y", "t1", Some(1)),
        ]);
        assert_eq!(names(&c), vec!["none", "t0", "t1", "t2"]);
    }

    #[test]
    fn test_get_index_negative_and_out_of_range() {
        let c = two();
        assert_eq!(c.get_index(-1).unwrap().descriptor.name.as_deref(), Some("t1"));
        assert_eq!(c.get_index(-2).unwrap().descriptor.name.as_deref(), Some("t0"));
        assert_eq!(
            c.get_index(-3).unwrap_err(),
            CollectionError::IndexOutOfRange { index: -3, len: 2 }
        );
        assert_eq!(
            c.get_index(2).unwrap_err(),
            CollectionError::IndexOutOfRange { index: 2, len: 2 }
        );
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_negative_index_emits_race_warning() {
        let c = two();
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        let name = tracing::subscriber::with_default(subscriber, || {
            let first = c.get_index(0).unwrap().descriptor.name.clone();
            assert!(captured.text().is_empty());
            assert!(c.get_index(-5).is_err());
            c.get_index(-1).unwrap().descriptor.name.clone().or(first)
        });

        assert_eq!(name.as_deref(), Some("t1"));
        let logs = captured.text();
        assert_eq!(logs.matches("negative index depends on the current snapshot").count(), 2);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("index=-1"));
    }

    #[test]
    fn test_get_id_not_found() {
        let c = Collection::from_entries(vec![entry("a@x.y", "t0", Some(0))]);
        let id = c.get_index(0).unwrap().descriptor.id().to_string();
        assert!(c.get_id(&id).is_ok());
        assert_eq!(
            c.get_id("missing").unwrap_err(),
            CollectionError::NotFound { id: "missing".to_string() }
        );
    }

    #[test]
    fn test_slice_provenance_and_clamping() {
        let c = numbered(5);
        let s = c.search("n").slice(1..3);
        assert_eq!(names(&s), vec!["n1", "n2"]);
        assert_eq!(s.provenance().to_string(), "Search results for 'n' (slice 1:3)");
        assert_eq!(c.slice(3..100).len(), 2);
        assert!(c.slice(10..).is_empty());
    }

    #[test]
    fn test_search_fields_and_reserved_keys() {
        let mut tagged = entry("bob@x.y", "plain", Some(0));
        tagged.descriptor.metadata.insert("tag".into(), serde_json::json!("Genomics"));
        tagged.descriptor.metadata.insert("_internal".into(), serde_json::json!("hidden"));
        let mut described = entry("carol@x.y", "other", Some(1));
        described.descriptor.description = Some("Quarterly REVENUE".into());
        let c = Collection::from_entries(vec![tagged, described]);

        assert_eq!(names(&c.search("genom")), vec!["plain"]);
        assert_eq!(names(&c.search("revenue")), vec!["other"]);
        assert!(c.search("hidden").is_empty());
        assert_eq!(names(&c.search("CAROL")), vec!["other"]);
        assert_eq!(names(&c.search("1970-01-01 00:00")).len(), 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_filter_by_owner_and_unique_projections() {
        let c = Collection::from_entries(vec![
            entry("bob@x.y", "b", Some(0)),
            entry("alice@x.y", "a", Some(1)),
            entry("bob@x.y", "a", Some(2)),
        ]);
        let f = c.filter_by_owner("BOB");
        assert_eq!(f.len(), 2);
        assert_eq!(f.provenance().to_string(), "Filtered by owner containing 'BOB'");
        assert_eq!(c.list_unique_owners(), vec!["alice@x.y", "bob@x.y"]);
        assert_eq!(c.list_unique_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_get_by_indices_skips_out_of_range() {
        let c = numbered(3);
        assert_eq!(names(&c.get_by_indices(&[2, 9, 0])), vec!["n2", "n0"]);
    }

    #[test]
    fn test_display_table() {
        assert_eq!(Collection::new().to_string(), "No syft objects available");
        let mut unnamed = entry("a@x.y", "x", Some(0));
        unnamed.descriptor.name = None;
        let text = Collection::from_entries(vec![unnamed]).to_string();
        assert!(text.starts_with("Index | Owner"));
        assert!(text.contains("Unnamed Object"));
        assert!(text.contains("syft://a@x.y/private/objects/x.txt"));
    }
}
