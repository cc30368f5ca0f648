//! # Object Subcommands
//!
//! `syo list`, `syo show`, and `syo delete`.

use anyhow::Result;
use clap::Args;
use syo_store::{ListFilter, Registry};

use crate::{exit_code_for, lookup, EXIT_CHECK_FAILED};

/// Arguments for `syo list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive search over names, owners, descriptions, timestamps, and metadata.
    #[arg(long, conflicts_with = "owner")]
    pub search: Option<String>,

    /// Only objects whose owner contains this text.
    #[arg(long)]
    pub owner: Option<String>,

    /// Print the unique owners instead of the table.
    #[arg(long, conflicts_with = "names")]
    pub owners: bool,

    /// Print the unique names instead of the table.
    #[arg(long)]
    pub names: bool,
}

/// Arguments for `syo show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Object id, collection index, or sidecar path.
    pub target: String,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `syo delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Object id, collection index, or sidecar path.
    pub target: String,

    /// Principal requesting the delete. Defaults to the configured owner.
    #[arg(long)]
    pub requester: Option<String>,
}

pub fn run_list(args: &ListArgs, registry: &mut Registry) -> Result<u8> {
    registry.refresh();
    let filter = match (&args.search, &args.owner) {
        (Some(term), _) => Some(ListFilter::Search(term.clone())),
        (None, Some(owner)) => Some(ListFilter::Owner(owner.clone())),
        (None, None) => None,
    };
    let view = registry.list(filter.as_ref());

    if args.owners {
        for owner in view.list_unique_owners() {
            println!("{owner}");
        }
    } else if args.names {
        for name in view.list_unique_names() {
            println!("{name}");
        }
    } else if view.is_empty() {
        println!("{view}");
    } else {
        print!("{view}");
        println!();
        println!("Total: {} objects", view.len());
    }
    Ok(0)
}

pub fn run_show(args: &ShowArgs, registry: &mut Registry) -> Result<u8> {
    let handle = match lookup(registry, &args.target) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    let info = handle.info();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(0);
    }

    let show = |label: &str, value: String| println!("  {label:<13} {value}");
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    println!("{}", info.name.as_deref().unwrap_or("Unnamed Object"));
    show("id:", info.id.clone());
    show("owner:", info.owner.clone());
    show("type:", info.file_type.clone());
    show("created:", or_dash(info.created_at.map(|t| t.to_rfc3339())));
    show("updated:", or_dash(info.updated_at.map(|t| t.to_rfc3339())));
    show("private:", or_dash(info.private_url.as_ref().map(ToString::to_string)));
    show("  local:", or_dash(info.private_path.as_ref().map(|p| p.display().to_string())));
    show("mock:", or_dash(info.mock_url.as_ref().map(ToString::to_string)));
    show("  local:", or_dash(info.mock_path.as_ref().map(|p| p.display().to_string())));
    show("sidecar:", info.sidecar.display().to_string());
    if let Some(note) = handle.mock().note() {
        show("mock note:", note.to_string());
    }
    if let Some(description) = &info.description {
        show("description:", description.clone());
    }
    for (key, value) in &info.metadata {
        show(&format!("{key}:"), value.to_string());
    }
    Ok(0)
}

pub fn run_delete(args: &DeleteArgs, registry: &mut Registry) -> Result<u8> {
    let handle = match lookup(registry, &args.target) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    let requester = args
        .requester
        .clone()
        .unwrap_or_else(|| registry.config().owner.clone());
    let id = handle.id().to_string();
    let outcome = match registry.delete(&id, &requester) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    println!("  mock:    {:?}", outcome.mock);
    println!("  private: {:?}", outcome.private);
    println!("  sidecar: {:?}", outcome.sidecar);
    if outcome.is_complete() {
        println!("deleted {id}");
        Ok(0)
    } else {
        println!("partially deleted {id}");
        Ok(EXIT_CHECK_FAILED)
    }
}
