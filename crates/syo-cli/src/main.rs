//! # syo CLI entry point
//!
//! Parses command-line arguments, loads the store configuration from the
//! environment, and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use syo_cli::create::{run_create, CreateArgs};
use syo_cli::inspect::{
    run_relink, run_resolve, run_validate, RelinkArgs, ResolveArgs, ValidateArgs,
};
use syo_cli::objects::{run_delete, run_list, run_show, DeleteArgs, ListArgs, ShowArgs};
use syo_cli::EXIT_ERROR;
use syo_store::{Registry, StoreConfig};

/// Manage syft objects: private artifacts paired with shareable mocks.
#[derive(Parser, Debug)]
#[command(name = "syo", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the objects visible in the datasites tree.
    List(ListArgs),

    /// Show one object's URLs, local paths, and metadata.
    Show(ShowArgs),

    /// Create an object from files, folders, or literal text.
    Create(CreateArgs),

    /// Check that an object's mock is compatible with its private artifact.
    Validate(ValidateArgs),

    /// Print where each facet of an object resolves locally.
    Resolve(ResolveArgs),

    /// Re-record the relative paths of an object against its sidecar.
    Relink(RelinkArgs),

    /// Delete an object's artifacts and sidecar.
    Delete(DeleteArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };
    tracing::debug!(
        owner = %config.owner,
        datasites = %config.datasites.display(),
        "loaded configuration"
    );
    let mut registry = Registry::from_config(config);

    let result = match &cli.command {
        Commands::List(args) => run_list(args, &mut registry),
        Commands::Show(args) => run_show(args, &mut registry),
        Commands::Create(args) => run_create(args, &mut registry),
        Commands::Validate(args) => run_validate(args, &mut registry),
        Commands::Resolve(args) => run_resolve(args, &mut registry),
        Commands::Relink(args) => run_relink(args, &mut registry),
        Commands::Delete(args) => run_delete(args, &mut registry),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use syo_core::Facet;

    #[test]
    fn test_parse_list_with_search() {
        let cli = Cli::try_parse_from(["syo", "list", "--search", "census"]).unwrap();
        if let Commands::List(args) = cli.command {
            assert_eq!(args.search.as_deref(), Some("census"));
            assert!(!args.owners);
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn test_search_and_owner_conflict() {
        assert!(Cli::try_parse_from(["syo", "list", "--search", "a", "--owner", "b"]).is_err());
    }

    #[test]
    fn test_parse_show_negative_index() {
        let cli = Cli::try_parse_from(["syo", "show", "--", "-1"]).unwrap();
        if let Commands::Show(args) = cli.command {
            assert_eq!(args.target, "-1");
            assert!(!args.json);
        } else {
            panic!("expected show");
        }
    }

    #[test]
    fn test_parse_validate_pair() {
        let cli =
            Cli::try_parse_from(["syo", "validate", "--pair", "mock.csv", "real.csv"]).unwrap();
        if let Commands::Validate(args) = cli.command {
            assert!(args.target.is_none());
            assert_eq!(
                args.pair,
                Some(vec![PathBuf::from("mock.csv"), PathBuf::from("real.csv")])
            );
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn test_validate_needs_a_target() {
        assert!(Cli::try_parse_from(["syo", "validate"]).is_err());
    }

    #[test]
    fn test_parse_resolve_facet() {
        let cli = Cli::try_parse_from(["syo", "resolve", "abc", "--facet", "mock"]).unwrap();
        if let Commands::Resolve(args) = cli.command {
            assert_eq!(args.facet, Some(Facet::Mock));
        } else {
            panic!("expected resolve");
        }
        assert!(Cli::try_parse_from(["syo", "resolve", "abc", "--facet", "bogus"]).is_err());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["syo", "delete", "abc", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        if let Commands::Delete(args) = cli.command {
            assert_eq!(args.target, "abc");
            assert!(args.requester.is_none());
        } else {
            panic!("expected delete");
        }
    }
}
