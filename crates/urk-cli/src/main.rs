//! # urk CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use urk_cli::keys::{run_keys, KeysArgs};
use urk_cli::ledger::{run_ledger, LedgerArgs};
use urk_cli::revocation::{run_revocation, RevocationArgs};
use urk_cli::DataPaths;

/// Universal Reliance Kernel operator CLI.
///
/// Manages issuer keys, inspects the compliance ledger, and revokes
/// credentials on a node's data directory.
#[derive(Parser, Debug)]
#[command(name = "urk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    paths: DataPaths,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issuer key generation and listing.
    Keys(KeysArgs),

    /// Compliance ledger verification and inspection.
    Ledger(LedgerArgs),

    /// Credential revocation and status lookup.
    Revocation(RevocationArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(data_dir = %cli.paths.data_dir.display(), "urk CLI starting");

    let result = match &cli.command {
        Commands::Keys(args) => run_keys(args, &cli.paths),
        Commands::Ledger(args) => run_ledger(args, &cli.paths),
        Commands::Revocation(args) => run_revocation(args, &cli.paths),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
