//! # syo-validate — Mock/Private Compatibility
//!
//! Guarantees a mock artifact remains a safe, useful stand-in for the
//! private artifact it represents. The check is structural only: column
//! names for tables, top-level keys for documents. Values are never
//! compared, and the private side's values never appear in an error.
//!
//! ## Formats
//!
//! | Extension        | Rule                                     |
//! |------------------|------------------------------------------|
//! | `csv`, `tsv`     | header diff, sampled type warnings       |
//! | `parquet`        | footer field diff, physical type warnings|
//! | `json`, `yaml`   | root kind, then object key diff          |
//! | anything else    | extension equality                       |
//!
//! ## Crate Policy
//!
//! - Depends only on `syo-core` internally.
//! - Error details are deterministic: set members are sorted.

pub mod error;
pub mod format;
pub mod structured;
pub mod tabular;
pub mod validator;

pub use error::{TypeWarning, ValidationError, ValidationErrorKind, ValidationReport};
pub use format::Format;
pub use validator::{validate, CompatibilityValidator};
