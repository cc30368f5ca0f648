//! # Object Factory
//!
//! Builds a descriptor from caller content, places the artifacts, persists
//! the sidecar, then validates the pair and pushes permissions.
//!
//! ## Steps
//!
//! 1. Check the request: no reserved metadata keys, no folder/file mix,
//!    caller-supplied paths exist, file extensions agree.
//! 2. Assign an id and derive names: `<slug>_<id8>.<ext>` for private,
//!    `<slug>_<id8>_mock.<ext>` for mock, `<slug>_<id8>.syftobject.yaml`
//!    for the sidecar.
//! 3. Stage inline and auto-generated content under the staging directory.
//! 4. Place each artifact where the addressing client maps its URL. Staged
//!    content is moved, caller files are copied, and `reference_only`
//!    leaves caller files where they are. Anything that cannot be placed
//!    stays put and is recorded as an absolute fallback.
//! 5. Persist the sidecar. A relative `basePath` is stored relative to the
//!    sidecar's directory.
//! 6. Validate caller-supplied pairs, then push permissions.
//!
//! A validation failure is returned after the sidecar and artifacts are
//! already on disk. Nothing is rolled back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use syo_core::sidecar::{self, with_sidecar_suffix};
use syo_core::url::extension_of;
use syo_core::{
    is_reserved_key, CapabilityList, Descriptor, Facet, ObjectId, ObjectKind, SyftUrl, Visibility,
    FILE_OPERATIONS_KEY, MOCK_NOTE_KEY, SIDECAR_SUFFIX,
};
use syo_resolve::paths::{absolutize, relative_path};
use syo_validate::{ValidationError, ValidationReport};

use crate::error::StoreError;
use crate::fsops::{copy_path, move_path};
use crate::object::ObjectHandle;
use crate::permission::{push, Degraded, DegradedReason, PermissionSet, PushOutcome};
use crate::registry::StoreContext;

/// Extension used for inline content when nothing else names one.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Characters of private text previewed in an auto-generated mock.
const MOCK_PREVIEW_CHARS: usize = 50;

/// Where a facet's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Bytes written to a new file.
    Inline(Vec<u8>),
    /// An existing file.
    File(PathBuf),
    /// An existing directory.
    Folder(PathBuf),
}

impl ContentSource {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Inline(text.into().into_bytes())
    }

    fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    fn path(&self) -> Option<&Path> {
        match self {
            Self::Inline(_) => None,
            Self::File(p) | Self::Folder(p) => Some(p),
        }
    }
}

/// Input to [`crate::Registry::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub private: Option<ContentSource>,
    pub mock: Option<ContentSource>,
    /// Extension for inline content when neither side is an existing file.
    pub extension: Option<String>,

    pub discovery_read: Option<CapabilityList>,
    pub mock_read: Option<CapabilityList>,
    pub mock_write: Option<CapabilityList>,
    pub private_read: Option<CapabilityList>,
    pub private_write: Option<CapabilityList>,

    pub metadata: BTreeMap<String, serde_json::Value>,
    pub mock_note: Option<String>,

    pub skip_validation: bool,
    /// Leave caller files in place instead of copying them into the datasite.
    pub reference_only: bool,
    pub base_path: Option<PathBuf>,
    pub use_relative_paths: bool,
    /// Explicit sidecar path.
    pub save_to: Option<PathBuf>,
}

impl CreateRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_private(mut self, source: ContentSource) -> Self {
        self.private = Some(source);
        self
    }

    pub fn with_mock(mut self, source: ContentSource) -> Self {
        self.mock = Some(source);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }
}

/// Result of a successful create.
#[derive(Debug)]
pub struct CreateOutcome {
    pub handle: ObjectHandle,
    pub validation: ValidationReport,
    pub permissions: PushOutcome,
}

/// A facet's content after staging.
struct Staged {
    path: PathBuf,
    /// Inline or auto-generated content living in the staging directory.
    owned: bool,
    auto: bool,
}

pub(crate) fn create(
    ctx: &Arc<StoreContext>,
    request: CreateRequest,
) -> Result<CreateOutcome, StoreError> {
    check_request(&request)?;

    let id = ObjectId::new();
    let kind = if [&request.private, &request.mock]
        .into_iter()
        .flatten()
        .any(ContentSource::is_folder)
    {
        ObjectKind::Folder
    } else {
        ObjectKind::File
    };
    let name = request.name.clone().unwrap_or_else(|| derive_name(&request, &id));
    let stem = format!("{}_{}", slug(&name), id.short());
    let owner = ctx.config.owner.clone();

    let private_ext = request.private.as_ref().and_then(source_extension);
    let mock_ext = request.mock.as_ref().and_then(source_extension);
    if let (Some(m), Some(p)) = (&mock_ext, &private_ext) {
        if m != p {
            return Err(ValidationError::extension_mismatch(m, p).into());
        }
    }
    let extension = private_ext
        .or(mock_ext)
        .or_else(|| request.extension.clone().map(|e| e.trim_start_matches('.').to_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let filename = |suffix: &str| match kind {
        ObjectKind::Folder => format!("{stem}{suffix}"),
        ObjectKind::File => format!("{stem}{suffix}.{extension}"),
    };

    let mut descriptor = Descriptor::new(id, kind);
    descriptor.name = Some(name.clone());
    descriptor.description = request.description.clone();
    descriptor.discovery_read = request
        .discovery_read
        .clone()
        .unwrap_or_else(CapabilityList::public);
    descriptor.mock_read = request.mock_read.clone().unwrap_or_else(CapabilityList::public);
    descriptor.mock_write = request.mock_write.clone().unwrap_or_default();
    descriptor.private_read = request
        .private_read
        .clone()
        .unwrap_or_else(|| CapabilityList::only(owner.clone()));
    descriptor.private_write = request
        .private_write
        .clone()
        .unwrap_or_else(|| CapabilityList::only(owner.clone()));
    descriptor.metadata = request.metadata.clone();
    if let Some(note) = &request.mock_note {
        descriptor.metadata.insert(MOCK_NOTE_KEY.to_string(), json!(note));
    }

    let mock_visibility = if descriptor.mock_read.is_public() {
        Visibility::Public
    } else {
        Visibility::Private
    };
    let url = |visibility, name: &str| match kind {
        ObjectKind::Folder => SyftUrl::folder(&owner, visibility, name),
        ObjectKind::File => SyftUrl::object(&owner, visibility, name),
    };
    let private_url = url(Visibility::Private, &filename(""));
    let mock_url = url(mock_visibility, &filename("_mock"));

    let staging = ctx.resolver.staging_dir().to_path_buf();
    let private = stage_private(&request, kind, &name, &staging, &private_url)?;
    let mock = stage_mock(&request, kind, &name, &staging, &mock_url)?;

    let mut operations = Vec::new();
    for (facet, staged, url) in [
        (Facet::Private, &private, &private_url),
        (Facet::Mock, &mock, &mock_url),
    ] {
        let placed = place(ctx, &request, facet, staged, url, &mut operations)?;
        if placed.as_ref() != ctx.client.to_local_path(url).ok().flatten().as_ref() {
            descriptor.set_absolute_fallback(facet, placed);
        }
    }
    descriptor.private_location = Some(private_url);
    descriptor.mock_location = Some(mock_url);
    if !operations.is_empty() {
        descriptor.metadata.insert(FILE_OPERATIONS_KEY.to_string(), json!(operations));
    }

    let sidecar_path = sidecar_location(ctx, &request, &mut descriptor, &stem);
    let sidecar_dir = sidecar_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.config.cwd.clone());
    if let Some(base) = &request.base_path {
        descriptor.base_path = Some(if base.is_relative() {
            relative_path(&sidecar_dir, &absolutize(base, &ctx.config.cwd))
        } else {
            base.clone()
        });
    }

    sidecar::save(&descriptor, &sidecar_path)?;
    let resolver = ctx.resolver.anchored(&sidecar_dir);
    if request.use_relative_paths {
        let updated = resolver.update_relative_paths(&mut descriptor);
        tracing::debug!(id = %descriptor.id(), facets = updated.len(), "relative paths recorded");
        sidecar::save(&descriptor, &sidecar_path)?;
    }
    tracing::info!(
        id = %descriptor.id(),
        name = %name,
        sidecar = %sidecar_path.display(),
        "object created"
    );

    let validation = if request.skip_validation || private.auto || mock.auto || kind.is_folder() {
        Ok(ValidationReport::unchecked())
    } else {
        match (
            resolver.resolve(&descriptor, Facet::Mock),
            resolver.resolve(&descriptor, Facet::Private),
        ) {
            (Some(m), Some(p)) => ctx.validator.validate(&m, &p, false),
            _ => {
                tracing::debug!(id = %descriptor.id(), "pair not resolvable; validation skipped");
                Ok(ValidationReport::unchecked())
            }
        }
    };

    // The sidecar is already on disk, so grants go out even when the pair
    // fails validation.
    let handle = ObjectHandle::new(descriptor, sidecar_path, Arc::clone(ctx));
    let permissions = push_all(&handle);
    let validation = validation?;
    Ok(CreateOutcome {
        handle,
        validation,
        permissions,
    })
}

fn check_request(request: &CreateRequest) -> Result<(), StoreError> {
    if let Some(key) = request.metadata.keys().find(|k| is_reserved_key(k)) {
        return Err(StoreError::InvalidRequest(format!(
            "metadata key '{key}' is reserved"
        )));
    }
    if let (Some(p), Some(m)) = (&request.private, &request.mock) {
        if p.is_folder() != m.is_folder() {
            return Err(StoreError::InvalidRequest(
                "private and mock must both be folders or both be files".to_string(),
            ));
        }
    }
    for source in [&request.private, &request.mock].into_iter().flatten() {
        let ok = match source {
            ContentSource::Inline(_) => true,
            ContentSource::File(p) => p.is_file(),
            ContentSource::Folder(p) => p.is_dir(),
        };
        if !ok {
            return Err(StoreError::ContentNotFound {
                path: source.path().map(Path::to_path_buf).unwrap_or_default(),
            });
        }
    }
    Ok(())
}

fn source_extension(source: &ContentSource) -> Option<String> {
    match source {
        ContentSource::File(p) => p.file_name().and_then(|n| n.to_str()).and_then(extension_of),
        _ => None,
    }
}

/// Name from the first caller path: `quarterly_sales.csv` becomes
/// `Quarterly Sales`. Falls back to `Object <id8>`.
fn derive_name(request: &CreateRequest, id: &ObjectId) -> String {
    [&request.private, &request.mock]
        .into_iter()
        .flatten()
        .find_map(|s| s.path().and_then(Path::file_stem).and_then(|s| s.to_str()))
        .map(title_case)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Object {}", id.short()))
}

fn title_case(stem: &str) -> String {
    stem.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// `My Data-Set` becomes `my_data_set`.
///
/// Anything other than ASCII letters and digits separates words, so the
/// result is always a single path component inside `objects/`.
pub fn slug(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        "object".to_string()
    } else {
        words.join("_")
    }
}

fn stage_private(
    request: &CreateRequest,
    kind: ObjectKind,
    name: &str,
    staging: &Path,
    url: &SyftUrl,
) -> Result<Staged, StoreError> {
    match &request.private {
        Some(ContentSource::Inline(bytes)) => stage_bytes(staging, url, bytes, false),
        Some(source) => Ok(caller_path(source)),
        None if kind.is_folder() => stage_dir(staging, url),
        None => stage_bytes(
            staging,
            url,
            format!("Auto-generated private content for {name}").as_bytes(),
            true,
        ),
    }
}

fn stage_mock(
    request: &CreateRequest,
    kind: ObjectKind,
    name: &str,
    staging: &Path,
    url: &SyftUrl,
) -> Result<Staged, StoreError> {
    match &request.mock {
        Some(ContentSource::Inline(bytes)) => stage_bytes(staging, url, bytes, false),
        Some(source) => Ok(caller_path(source)),
        None if kind.is_folder() => stage_dir(staging, url),
        None => {
            let text = match &request.private {
                Some(ContentSource::Inline(bytes)) => match std::str::from_utf8(bytes) {
                    Ok(text) => {
                        let preview: String = text.chars().take(MOCK_PREVIEW_CHARS).collect();
                        format!("[MOCK DATA] {preview}...")
                    }
                    Err(_) => format!("[MOCK DATA] Demo version of {name}"),
                },
                _ => format!("[MOCK DATA] Demo version of {name}"),
            };
            stage_bytes(staging, url, text.as_bytes(), true)
        }
    }
}

fn caller_path(source: &ContentSource) -> Staged {
    Staged {
        path: source.path().map(Path::to_path_buf).unwrap_or_default(),
        owned: false,
        auto: false,
    }
}

fn stage_bytes(
    staging: &Path,
    url: &SyftUrl,
    bytes: &[u8],
    auto: bool,
) -> Result<Staged, StoreError> {
    fs::create_dir_all(staging)?;
    let path = staging.join(url.filename());
    fs::write(&path, bytes)?;
    Ok(Staged {
        path,
        owned: true,
        auto,
    })
}

fn stage_dir(staging: &Path, url: &SyftUrl) -> Result<Staged, StoreError> {
    let path = staging.join(url.filename());
    fs::create_dir_all(&path)?;
    Ok(Staged {
        path,
        owned: true,
        auto: true,
    })
}

/// Put a staged artifact at its canonical location. Returns the absolute
/// path the artifact ends up at.
fn place(
    ctx: &StoreContext,
    request: &CreateRequest,
    facet: Facet,
    staged: &Staged,
    url: &SyftUrl,
    operations: &mut Vec<serde_json::Value>,
) -> Result<Option<PathBuf>, StoreError> {
    let source = absolutize(&staged.path, &ctx.config.cwd);
    if request.reference_only && !staged.owned {
        operations.push(json!({
            "facet": facet.as_str(),
            "action": "referenced",
            "path": source.display().to_string(),
        }));
        return Ok(Some(source));
    }
    let target = match ctx.client.to_local_path(url) {
        Ok(Some(target)) => target,
        Ok(None) => return Ok(Some(source)),
        Err(e) => {
            tracing::warn!(
                facet = %facet,
                url = %url,
                error = %e,
                "cannot map location; artifact stays at {}",
                source.display()
            );
            return Ok(Some(source));
        }
    };
    let action = if staged.owned {
        move_path(&source, &target)?;
        "moved"
    } else {
        copy_path(&source, &target)?;
        "copied"
    };
    operations.push(json!({
        "facet": facet.as_str(),
        "action": action,
        "from": source.display().to_string(),
        "to": target.display().to_string(),
    }));
    Ok(Some(target))
}

/// Sidecar path and the matching discovery location.
fn sidecar_location(
    ctx: &StoreContext,
    request: &CreateRequest,
    descriptor: &mut Descriptor,
    stem: &str,
) -> PathBuf {
    let visibility = if descriptor.discovery_read.is_public() {
        Visibility::Public
    } else {
        Visibility::Private
    };
    let owner = ctx.config.owner.clone();

    if let Some(save_to) = &request.save_to {
        let save_to = absolutize(save_to, &ctx.config.cwd);
        let file = save_to
            .file_name()
            .and_then(|n| n.to_str())
            .map(with_sidecar_suffix)
            .unwrap_or_else(|| format!("{stem}{SIDECAR_SUFFIX}"));
        descriptor.discovery_location = Some(SyftUrl::object(&owner, visibility, &file));
        return save_to.with_file_name(file);
    }

    let file = format!("{stem}{SIDECAR_SUFFIX}");
    let url = SyftUrl::object(&owner, visibility, &file);
    let path = match ctx.client.to_local_path(&url) {
        Ok(Some(path)) => absolutize(&path, &ctx.config.cwd),
        _ => {
            let path = ctx.resolver.staging_dir().join(&file);
            tracing::warn!(
                url = %url,
                "cannot map discovery location; sidecar stays at {}",
                path.display()
            );
            path
        }
    };
    descriptor.discovery_location = Some(url);
    path
}

/// Push every facet's grants. The first degraded facet is reported.
pub(crate) fn push_all(handle: &ObjectHandle) -> PushOutcome {
    let mut outcome = Ok(());
    for facet in Facet::ALL {
        let result = push_facet(handle, facet);
        if outcome.is_ok() {
            outcome = result;
        }
    }
    outcome
}

pub(crate) fn push_facet(handle: &ObjectHandle, facet: Facet) -> PushOutcome {
    let Some(path) = handle.resolve(facet) else {
        tracing::warn!(
            id = %handle.id(),
            facet = %facet,
            "cannot push permissions for unresolved artifact"
        );
        return Err(Degraded {
            reason: DegradedReason::Unresolved,
            fallback: (),
        });
    };
    let grants = PermissionSet::from_descriptor(handle.descriptor(), facet);
    push(handle.context().delegate.as_ref(), &path, &grants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_from_stem() {
        assert_eq!(title_case("quarterly_sales"), "Quarterly Sales");
        assert_eq!(title_case("ALL_CAPS_name"), "All Caps Name");
        assert_eq!(title_case("__"), "");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("My Data-Set"), "my_data_set");
        assert_eq!(slug("Q1/Report"), "q1_report");
        assert_eq!(slug("../../../../escaped"), "escaped");
        assert_eq!(slug("a\\b.c"), "a_b_c");
        assert_eq!(slug("  --  "), "object");
    }

    #[test]
    fn test_reserved_metadata_rejected() {
        let mut request = CreateRequest::new("x");
        request.metadata.insert("_secret".into(), json!(1));
        assert!(matches!(check_request(&request), Err(StoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_folder_file_mix_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let request = CreateRequest::new("x")
            .with_private(ContentSource::Folder(dir.path().to_path_buf()))
            .with_mock(ContentSource::text("hi"));
        assert!(matches!(check_request(&request), Err(StoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_missing_source_reported() {
        let request =
            CreateRequest::new("x").with_private(ContentSource::File("/nonexistent/a.csv".into()));
        assert!(matches!(
            check_request(&request),
            Err(StoreError::ContentNotFound { .. })
        ));
    }

    #[test]
    fn test_derive_name_falls_back_to_id() {
        let id = ObjectId::from_string("0123456789abcdef");
        let request = CreateRequest {
            private: Some(ContentSource::File("/data/my_data_file.csv".into())),
            ..CreateRequest::default()
        };
        assert_eq!(derive_name(&request, &id), "My Data File");
        assert_eq!(derive_name(&CreateRequest::default(), &id), "Object 01234567");
    }
}
