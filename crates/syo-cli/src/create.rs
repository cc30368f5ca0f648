//! # Create Subcommand
//!
//! `syo create` builds a [`CreateRequest`] from flags. Content comes from
//! files, folders, or literal text; every flag left out falls back to the
//! factory's defaults.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use syo_core::CapabilityList;
use syo_store::{ContentSource, CreateRequest, Registry};

use crate::exit_code_for;

/// Arguments for `syo create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Display name. Derived from the private file name when omitted.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Private artifact: a file or a folder.
    #[arg(long, conflicts_with = "private_text")]
    pub private: Option<PathBuf>,

    /// Private artifact as literal text.
    #[arg(long)]
    pub private_text: Option<String>,

    /// Mock artifact: a file or a folder. Auto-generated when omitted.
    #[arg(long, conflicts_with = "mock_text")]
    pub mock: Option<PathBuf>,

    /// Mock artifact as literal text.
    #[arg(long)]
    pub mock_text: Option<String>,

    /// Extension for literal text content.
    #[arg(long)]
    pub extension: Option<String>,

    /// Free-text note describing how the mock was made.
    #[arg(long)]
    pub mock_note: Option<String>,

    /// Comma-separated principals allowed to read the mock (`public` for everyone).
    #[arg(long, value_delimiter = ',')]
    pub mock_read: Option<Vec<String>>,

    /// Comma-separated principals allowed to read the private artifact.
    #[arg(long, value_delimiter = ',')]
    pub private_read: Option<Vec<String>>,

    /// Comma-separated principals allowed to discover the object.
    #[arg(long, value_delimiter = ',')]
    pub discovery_read: Option<Vec<String>>,

    /// Metadata entry as KEY=VALUE. Repeatable; values parse as JSON when they can.
    #[arg(long = "meta", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,

    #[arg(long)]
    pub skip_validation: bool,

    /// Record the given files where they are instead of copying them.
    #[arg(long)]
    pub reference_only: bool,

    /// Directory the relative paths are recorded against.
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Record relative paths so the tree can be moved as a whole.
    #[arg(long)]
    pub relative: bool,

    /// Explicit sidecar path.
    #[arg(long)]
    pub save_to: Option<PathBuf>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn source(path: Option<&Path>, text: Option<&str>) -> Result<Option<ContentSource>> {
    match (path, text) {
        (Some(path), _) if path.is_dir() => Ok(Some(ContentSource::Folder(path.to_path_buf()))),
        (Some(path), _) if path.is_file() => Ok(Some(ContentSource::File(path.to_path_buf()))),
        (Some(path), _) => bail!("no such file or folder: {}", path.display()),
        (None, Some(text)) => Ok(Some(ContentSource::text(text))),
        (None, None) => Ok(None),
    }
}

impl CreateArgs {
    /// Build the factory request.
    pub fn to_request(&self) -> Result<CreateRequest> {
        let list = |v: &Option<Vec<String>>| {
            v.as_ref().map(|v| v.iter().cloned().collect::<CapabilityList>())
        };
        let metadata = self
            .metadata
            .iter()
            .map(|(k, v)| {
                let value = serde_json::from_str(v)
                    .unwrap_or_else(|_| serde_json::Value::String(v.clone()));
                (k.clone(), value)
            })
            .collect();
        Ok(CreateRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            private: source(self.private.as_deref(), self.private_text.as_deref())
                .context("--private")?,
            mock: source(self.mock.as_deref(), self.mock_text.as_deref()).context("--mock")?,
            extension: self.extension.clone(),
            discovery_read: list(&self.discovery_read),
            mock_read: list(&self.mock_read),
            private_read: list(&self.private_read),
            metadata,
            mock_note: self.mock_note.clone(),
            skip_validation: self.skip_validation,
            reference_only: self.reference_only,
            base_path: self.base_path.clone(),
            use_relative_paths: self.relative,
            save_to: self.save_to.clone(),
            ..CreateRequest::default()
        })
    }
}

pub fn run_create(args: &CreateArgs, registry: &mut Registry) -> Result<u8> {
    let request = args.to_request()?;
    let outcome = match registry.create(request) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    let handle = &outcome.handle;
    println!("created {}", handle.id());
    println!("  name:    {}", handle.name().unwrap_or("Unnamed Object"));
    println!("  sidecar: {}", handle.sidecar_path().display());
    for warning in &outcome.validation.warnings {
        println!("  warning: {warning}");
    }
    if let Err(degraded) = &outcome.permissions {
        println!("  permissions not pushed: {}", degraded.reason);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("a=1").unwrap(), ("a".to_string(), "1".to_string()));
        assert_eq!(parse_key_value("a=b=c").unwrap().1, "b=c");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_request_from_flags() {
        let w = Wrapper::try_parse_from([
            "syo",
            "--name",
            "Sales",
            "--private-text",
            "a,b\n1,2\n",
            "--extension",
            "csv",
            "--mock-read",
            "bob@example.com,carol@example.com",
            "--meta",
            "rows=2",
            "--meta",
            "source=survey",
        ])
        .unwrap();
        let request = w.args.to_request().unwrap();
        assert_eq!(request.name.as_deref(), Some("Sales"));
        assert!(matches!(request.private, Some(ContentSource::Inline(_))));
        assert!(request.mock.is_none());
        assert_eq!(request.mock_read.unwrap().len(), 2);
        assert_eq!(request.metadata["rows"], serde_json::json!(2));
        assert_eq!(request.metadata["source"], serde_json::json!("survey"));
    }

    #[test]
    fn test_missing_private_path_is_an_error() {
        let w = Wrapper::try_parse_from(["syo", "--private", "/nonexistent/syo/a.csv"]).unwrap();
        assert!(w.args.to_request().is_err());
    }
}
