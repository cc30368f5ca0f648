//! # Validation Errors and Warnings
//!
//! A failed compatibility check carries a [`ValidationErrorKind`] and a
//! detail string. Detail strings list set members in sorted order so that
//! callers and tests can match them exactly.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Category of a compatibility failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// Both files carry extensions and they differ.
    ExtensionMismatch,
    /// Tabular column-name sets differ.
    ColumnMismatch,
    /// Structured documents have object roots whose top-level keys differ.
    KeyMismatch,
    /// Structured documents have roots of different kinds.
    TypeMismatch,
    /// One side is empty or does not parse in the declared format.
    EmptyOrInvalid,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtensionMismatch => "ExtensionMismatch",
            Self::ColumnMismatch => "ColumnMismatch",
            Self::KeyMismatch => "KeyMismatch",
            Self::TypeMismatch => "TypeMismatch",
            Self::EmptyOrInvalid => "EmptyOrInvalid",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mock artifact is not a safe stand-in for its private counterpart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}\nto skip validation, pass skip_validation")]
pub struct ValidationError {
    /// What kind of mismatch was found.
    pub kind: ValidationErrorKind,
    /// Deterministic description of the mismatch.
    pub detail: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Extensions of a mock/private pair differ.
    pub fn extension_mismatch(mock: &str, private: &str) -> Self {
        Self::new(
            ValidationErrorKind::ExtensionMismatch,
            format!("file extensions don't match: mock has '.{mock}', private has '.{private}'"),
        )
    }

    /// Build a set-difference failure with the fixed
    /// `missing in mock: {..}; extra in mock: {..}` phrasing.
    pub fn set_mismatch(
        kind: ValidationErrorKind,
        label: &str,
        what: &str,
        mock: &BTreeSet<String>,
        private: &BTreeSet<String>,
    ) -> Self {
        let missing: BTreeSet<&String> = private.difference(mock).collect();
        let extra: BTreeSet<&String> = mock.difference(private).collect();
        Self::new(
            kind,
            format!(
                "{label} {what} mismatch: missing in mock: {}; extra in mock: {}",
                render_set(missing),
                render_set(extra)
            ),
        )
    }
}

/// Render a sorted set as `{a, b}`; the empty set renders as `{}`.
pub fn render_set<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined: Vec<&str> = items.into_iter().map(String::as_str).collect();
    format!("{{{}}}", joined.join(", "))
}

/// A non-fatal difference found while validating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeWarning {
    pub column: String,
    pub mock_type: String,
    pub private_type: String,
}

impl fmt::Display for TypeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column {:?}: mock is {}, private is {}",
            self.column, self.mock_type, self.private_type
        )
    }
}

/// Outcome of a passing validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Column type differences. These never fail validation.
    pub warnings: Vec<TypeWarning>,
    /// False when no content comparison was performed: skip requested,
    /// folder pair, or a format without content rules.
    pub content_checked: bool,
}

impl ValidationReport {
    pub fn unchecked() -> Self {
        Self::default()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
