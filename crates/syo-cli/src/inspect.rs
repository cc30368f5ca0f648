//! # Inspection Subcommands
//!
//! `syo validate`, `syo resolve`, and `syo relink`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use syo_core::Facet;
use syo_store::Registry;

use crate::{exit_code_for, lookup, EXIT_CHECK_FAILED};

/// Arguments for `syo validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Object id, collection index, or sidecar path. Omit to compare two files.
    #[arg(required_unless_present = "pair")]
    pub target: Option<String>,

    /// Compare a mock file against a private file directly.
    #[arg(long, num_args = 2, value_names = ["MOCK", "PRIVATE"], conflicts_with = "target")]
    pub pair: Option<Vec<PathBuf>>,
}

/// Arguments for `syo resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Object id, collection index, or sidecar path.
    pub target: String,

    /// Facet to resolve (private, mock, discovery). All three when omitted.
    #[arg(long)]
    pub facet: Option<Facet>,
}

/// Arguments for `syo relink`.
#[derive(Args, Debug)]
pub struct RelinkArgs {
    /// Object id, collection index, or sidecar path.
    pub target: String,
}

pub fn run_validate(args: &ValidateArgs, registry: &mut Registry) -> Result<u8> {
    let result = match (&args.pair, &args.target) {
        (Some(pair), _) => match pair.as_slice() {
            [mock, private] => syo_validate::validate(mock, private, false).map_err(Into::into),
            _ => anyhow::bail!("--pair takes exactly two paths"),
        },
        (None, Some(target)) => lookup(registry, target).and_then(|handle| handle.validate(false)),
        (None, None) => anyhow::bail!("nothing to validate"),
    };
    match result {
        Ok(report) => {
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            if report.content_checked {
                println!("compatible");
            } else {
                println!("compatible (no content rules for this pair)");
            }
            Ok(0)
        }
        Err(e) => {
            println!("{e}");
            Ok(exit_code_for(&e))
        }
    }
}

pub fn run_resolve(args: &ResolveArgs, registry: &mut Registry) -> Result<u8> {
    let handle = match lookup(registry, &args.target) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    let facets = match args.facet {
        Some(facet) => vec![facet],
        None => Facet::ALL.to_vec(),
    };
    let resolver = handle.resolver();
    let mut missing = false;
    for facet in facets {
        match resolver.resolve_traced(handle.descriptor(), facet) {
            Some(resolution) => println!(
                "{:<10} {} ({})",
                facet.as_str(),
                resolution.path.display(),
                resolution.strategy
            ),
            None => {
                missing = true;
                println!("{:<10} not available locally", facet.as_str());
            }
        }
    }
    Ok(if missing { EXIT_CHECK_FAILED } else { 0 })
}

pub fn run_relink(args: &RelinkArgs, registry: &mut Registry) -> Result<u8> {
    let mut handle = match lookup(registry, &args.target) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    let updated = match handle.relink() {
        Ok(updated) => updated,
        Err(e) => {
            tracing::error!("{e}");
            return Ok(exit_code_for(&e));
        }
    };
    let names: Vec<&str> = updated.iter().map(Facet::as_str).collect();
    println!("relinked {}: {}", handle.id(), names.join(", "));
    Ok(if updated.is_empty() { EXIT_CHECK_FAILED } else { 0 })
}
