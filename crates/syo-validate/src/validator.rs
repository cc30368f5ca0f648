//! # Compatibility Validator
//!
//! Checks that a mock artifact is a structurally faithful stand-in for its
//! private counterpart: same file type, same column names or top-level keys,
//! and never a shape the private side does not have.
//!
//! ## Policy
//!
//! 1. `skip` short-circuits to success.
//! 2. Directory pairs are never compared.
//! 3. Differing extensions fail with `ExtensionMismatch`. A side without an
//!    extension is not checked.
//! 4. The shared extension picks a [`Format`]:
//!    - tabular: unreadable sides fail with `EmptyOrInvalid`, column-name
//!      differences with `ColumnMismatch`, type differences only warn;
//!    - structured: unreadable sides fail with `EmptyOrInvalid`, root-kind
//!      differences with `TypeMismatch`, object-root key differences with
//!      `KeyMismatch`; list and scalar roots are not compared further;
//!    - anything else passes on extension equality alone.
//!
//! Mock side problems are reported before private side problems.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use syo_core::url::extension_of;

use crate::error::{TypeWarning, ValidationError, ValidationErrorKind, ValidationReport};
use crate::format::Format;
use crate::structured::{read_document, RootKind};
use crate::tabular::{read_delimited, read_parquet, ColumnType, TableSchema};

/// Default number of data rows sampled for delimited type inference.
pub const DEFAULT_SAMPLE_ROWS: usize = 100;

/// Validates mock/private artifact pairs.
#[derive(Debug, Clone)]
pub struct CompatibilityValidator {
    sample_rows: usize,
}

impl Default for CompatibilityValidator {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

impl CompatibilityValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    /// Check a resolved mock path against a resolved private path.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` describing the first mismatch found.
    pub fn validate(
        &self,
        mock: &Path,
        private: &Path,
        skip: bool,
    ) -> Result<ValidationReport, ValidationError> {
        if skip {
            return Ok(ValidationReport::unchecked());
        }
        if mock.is_dir() || private.is_dir() {
            return Ok(ValidationReport::unchecked());
        }

        let mock_ext = file_extension(mock);
        let private_ext = file_extension(private);
        let format = match (mock_ext, private_ext) {
            (Some(m), Some(p)) if m != p => {
                return Err(ValidationError::extension_mismatch(&m, &p));
            }
            (Some(shared), Some(_)) => Format::from_extension(&shared),
            _ => Format::Opaque,
        };

        match format {
            Format::Delimited { delimiter, .. } => self.compare_tables(format, mock, private, |p| {
                read_delimited(p, delimiter, self.sample_rows)
            }),
            Format::Parquet => self.compare_tables(format, mock, private, read_parquet),
            Format::Json | Format::Yaml => compare_documents(format, mock, private),
            Format::Opaque => Ok(ValidationReport::unchecked()),
        }
    }

    fn compare_tables<F>(
        &self,
        format: Format,
        mock: &Path,
        private: &Path,
        read: F,
    ) -> Result<ValidationReport, ValidationError>
    where
        F: Fn(&Path) -> Result<TableSchema, String>,
    {
        let label = format.label();
        let mock_schema = read(mock).map_err(|r| empty_or_invalid(label, "mock", &r))?;
        let private_schema = read(private).map_err(|r| empty_or_invalid(label, "private", &r))?;

        let mock_cols: BTreeSet<String> = mock_schema.names().map(str::to_string).collect();
        let private_cols: BTreeSet<String> = private_schema.names().map(str::to_string).collect();
        if mock_cols != private_cols {
            return Err(ValidationError::set_mismatch(
                ValidationErrorKind::ColumnMismatch,
                label,
                "column",
                &mock_cols,
                &private_cols,
            ));
        }

        let mock_types = mock_schema.types();
        let private_types = private_schema.types();
        let mut warnings = Vec::new();
        for (column, mock_ty) in &mock_types {
            let Some(private_ty) = private_types.get(column) else {
                continue;
            };
            if differs(mock_ty, private_ty) {
                warnings.push(TypeWarning {
                    column: column.to_string(),
                    mock_type: mock_ty.to_string(),
                    private_type: private_ty.to_string(),
                });
            }
        }
        if !warnings.is_empty() {
            tracing::warn!(
                mock = %mock.display(),
                private = %private.display(),
                differences = warnings.len(),
                "column type differences between mock and private"
            );
            for w in &warnings {
                tracing::warn!("{label} {w}");
            }
        }

        Ok(ValidationReport {
            warnings,
            content_checked: true,
        })
    }
}

/// Validate with default settings.
///
/// # Errors
///
/// See [`CompatibilityValidator::validate`].
pub fn validate(
    mock: &Path,
    private: &Path,
    skip: bool,
) -> Result<ValidationReport, ValidationError> {
    CompatibilityValidator::default().validate(mock, private, skip)
}

fn compare_documents(
    format: Format,
    mock: &Path,
    private: &Path,
) -> Result<ValidationReport, ValidationError> {
    let label = format.label();
    let mock_doc = read_document(mock, format).map_err(|r| empty_or_invalid(label, "mock", &r))?;
    let private_doc =
        read_document(private, format).map_err(|r| empty_or_invalid(label, "private", &r))?;

    let (mock_kind, private_kind) = (RootKind::of(&mock_doc), RootKind::of(&private_doc));
    if mock_kind != private_kind {
        return Err(ValidationError::new(
            ValidationErrorKind::TypeMismatch,
            format!(
                "{label} type mismatch: mock is {}, private is {}",
                mock_kind.as_str(),
                private_kind.as_str()
            ),
        ));
    }

    if let (Value::Object(m), Value::Object(p)) = (&mock_doc, &private_doc) {
        let mock_keys: BTreeSet<String> = m.keys().cloned().collect();
        let private_keys: BTreeSet<String> = p.keys().cloned().collect();
        if mock_keys != private_keys {
            return Err(ValidationError::set_mismatch(
                ValidationErrorKind::KeyMismatch,
                label,
                "key",
                &mock_keys,
                &private_keys,
            ));
        }
    }

    Ok(ValidationReport {
        warnings: Vec::new(),
        content_checked: true,
    })
}

fn file_extension(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).and_then(extension_of)
}

fn empty_or_invalid(label: &str, side: &str, reason: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::EmptyOrInvalid,
        format!("{label}: {side} {reason}"),
    )
}

fn differs(a: &ColumnType, b: &ColumnType) -> bool {
    !matches!(a, ColumnType::Unknown) && !matches!(b, ColumnType::Unknown) && a != b
}
