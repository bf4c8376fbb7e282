//! # Ledger Subcommand
//!
//! Offline checks on the compliance ledger file. `verify` exits with code 2
//! when the chain is broken so scripts can tell corruption apart from an
//! unreadable file (code 1).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use urk_ledger::{ComplianceLedger, LedgerError};

use crate::DataPaths;

#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Recompute every block hash and link.
    Verify,

    /// Print blocks as JSON lines, newest last.
    Show {
        /// Only the last N blocks.
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run_ledger(args: &LedgerArgs, paths: &DataPaths) -> Result<u8> {
    match &args.command {
        LedgerCommand::Verify => cmd_verify(paths),
        LedgerCommand::Show { limit } => cmd_show(paths, *limit),
    }
}

fn cmd_verify(paths: &DataPaths) -> Result<u8> {
    let path = paths.ledger_path();
    if !path.exists() {
        anyhow::bail!("no ledger at {}", path.display());
    }
    match ComplianceLedger::open(&path) {
        Ok(ledger) => {
            let report = ledger.report();
            println!(
                "OK: chain valid ({} blocks, tip {})",
                report.length, report.tip
            );
            Ok(0)
        }
        Err(LedgerError::Corruption { sequence }) => {
            println!("FAIL: chain broken at sequence {sequence}");
            Ok(2)
        }
        Err(e) => Err(e).with_context(|| format!("failed to read ledger: {}", path.display())),
    }
}

fn cmd_show(paths: &DataPaths, limit: Option<usize>) -> Result<u8> {
    let path = paths.ledger_path();
    if !path.exists() {
        anyhow::bail!("no ledger at {}", path.display());
    }
    let ledger = ComplianceLedger::open(&path)
        .with_context(|| format!("failed to open ledger: {}", path.display()))?;
    let blocks = ledger.blocks();
    let skip = limit.map_or(0, |n| blocks.len().saturating_sub(n));
    for block in &blocks[skip..] {
        println!("{}", serde_json::to_string(block)?);
    }
    Ok(0)
}
