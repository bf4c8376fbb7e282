//! # Revocation Subcommand
//!
//! Revoke or look up a credential against the node's revocation store.
//! With `--revocation-url` the shared HTTP store is used instead of the
//! local file. A new revocation is also recorded in the local ledger.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use url::Url;

use urk_ledger::{ComplianceLedger, EventType};
use urk_policy::{FileRevocationStore, HttpRevocationStore, RevocationRegistry, RevocationStore};

use crate::DataPaths;

#[derive(Args, Debug)]
pub struct RevocationArgs {
    /// Remote revocation store base URL.
    #[arg(long)]
    pub revocation_url: Option<Url>,

    /// Bearer token for the remote store.
    #[arg(long)]
    pub revocation_token: Option<String>,

    #[command(subcommand)]
    pub command: RevocationCommand,
}

#[derive(Subcommand, Debug)]
pub enum RevocationCommand {
    /// Mark a credential as revoked.
    Revoke {
        /// Credential id (the `id` field of the credential).
        credential_id: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Show whether a credential is revoked.
    Status { credential_id: String },
}

pub fn run_revocation(args: &RevocationArgs, paths: &DataPaths) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let registry = open_registry(args, paths)?;

    match &args.command {
        RevocationCommand::Revoke { credential_id, reason } => {
            runtime.block_on(cmd_revoke(&registry, paths, credential_id, reason.as_deref()))
        }
        RevocationCommand::Status { credential_id } => runtime.block_on(cmd_status(&registry, credential_id)),
    }
}

fn open_registry(args: &RevocationArgs, paths: &DataPaths) -> Result<RevocationRegistry> {
    let store: Arc<dyn RevocationStore> = match &args.revocation_url {
        Some(url) => Arc::new(
            HttpRevocationStore::new(url.clone(), args.revocation_token.clone(), Duration::from_secs(5))
                .context("failed to build revocation client")?,
        ),
        None => {
            let path = paths.revocation_path();
            Arc::new(
                FileRevocationStore::open(&path)
                    .with_context(|| format!("failed to open revocation store: {}", path.display()))?,
            )
        }
    };
    Ok(RevocationRegistry::new(store))
}

async fn cmd_revoke(
    registry: &RevocationRegistry,
    paths: &DataPaths,
    credential_id: &str,
    reason: Option<&str>,
) -> Result<u8> {
    let outcome = registry
        .revoke(credential_id, reason)
        .await
        .with_context(|| format!("failed to revoke {credential_id}"))?;

    if !outcome.newly_revoked {
        println!("OK: {credential_id} already revoked ({})", outcome.reason);
        return Ok(0);
    }

    let ledger_path = paths.ledger_path();
    let ledger = ComplianceLedger::open(&ledger_path)
        .with_context(|| format!("failed to open ledger: {}", ledger_path.display()))?;
    ledger
        .append(
            EventType::Revocation,
            &serde_json::json!({
                "credential_id": outcome.credential_id,
                "reason": outcome.reason,
            }),
            None,
        )
        .context("failed to record revocation in ledger")?;

    println!("OK: revoked {credential_id} ({})", outcome.reason);
    Ok(0)
}

async fn cmd_status(registry: &RevocationRegistry, credential_id: &str) -> Result<u8> {
    match registry.reason(credential_id).await? {
        Some(reason) => println!("{credential_id}: REVOKED ({reason})"),
        None => println!("{credential_id}: ACTIVE"),
    }
    Ok(0)
}
