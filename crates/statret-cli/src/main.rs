//! # statret CLI entry point
//!
//! Parses command-line arguments, loads configuration from the
//! environment, and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use statret_cli::batch::{run_create, run_list, run_write, CreateArgs, ListArgs, WriteArgs};
use statret_cli::identifier::{run_next_id, NextIdArgs};
use statret_engine::ReturnConfig;

/// Statutory student return generator.
///
/// Builds legacy and data-futures return documents from a snapshot of
/// operational records, and keeps the batch history in a local database.
#[derive(Parser, Debug)]
#[command(name = "statret", version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build, write and record a new batch.
    Create(CreateArgs),

    /// Re-serialize an existing populated batch.
    Write(WriteArgs),

    /// Allocate the next checksum identifier for a year.
    NextId(NextIdArgs),

    /// List batches, newest first.
    List(ListArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let config = match ReturnConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let result = match &cli.command {
        Commands::Create(args) => run_create(args, &config),
        Commands::Write(args) => run_write(args, &config),
        Commands::NextId(args) => run_next_id(args, &config),
        Commands::List(args) => run_list(args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statret_core::Generation;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_create() {
        let cli = Cli::try_parse_from([
            "statret",
            "create",
            "--year",
            "2022",
            "--generation",
            "data-futures",
            "--snapshot",
            "records.json",
        ])
        .unwrap();
        assert!(!cli.json);
        if let Commands::Create(args) = cli.command {
            assert_eq!(args.year.value(), 2022);
            assert_eq!(args.generation, Generation::DataFutures);
            assert_eq!(args.snapshot, PathBuf::from("records.json"));
            assert_eq!(args.created_by, "statret");
        } else {
            panic!("expected create");
        }
    }

    #[test]
    fn cli_parse_create_with_creator() {
        let cli = Cli::try_parse_from([
            "statret",
            "create",
            "--year",
            "2023",
            "--generation",
            "legacy",
            "--snapshot",
            "s.yaml",
            "--created-by",
            "registry",
        ])
        .unwrap();
        if let Commands::Create(args) = cli.command {
            assert_eq!(args.generation, Generation::Legacy);
            assert_eq!(args.created_by, "registry");
        }
    }

    #[test]
    fn cli_parse_create_rejects_unknown_generation() {
        let result = Cli::try_parse_from([
            "statret",
            "create",
            "--year",
            "2022",
            "--generation",
            "modern",
            "--snapshot",
            "s.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_create_rejects_bad_year() {
        let result = Cli::try_parse_from([
            "statret",
            "create",
            "--year",
            "22",
            "--generation",
            "legacy",
            "--snapshot",
            "s.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_write() {
        let cli = Cli::try_parse_from(["statret", "write", "--batch", "14"]).unwrap();
        if let Commands::Write(args) = cli.command {
            assert_eq!(args.batch, 14);
        } else {
            panic!("expected write");
        }
    }

    #[test]
    fn cli_parse_next_id() {
        let cli = Cli::try_parse_from(["statret", "next-id", "--year", "2022", "--sid"]).unwrap();
        if let Commands::NextId(args) = cli.command {
            assert!(args.sid);
            assert_eq!(args.year.value(), 2022);
        } else {
            panic!("expected next-id");
        }
    }

    #[test]
    fn cli_parse_list_with_global_json() {
        let cli = Cli::try_parse_from(["statret", "list", "--json", "--limit", "5"]).unwrap();
        assert!(cli.json);
        if let Commands::List(args) = cli.command {
            assert_eq!(args.limit, Some(5));
        }
    }

    #[test]
    fn cli_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["statret"]).is_err());
    }
}
