//! # Keys Subcommand
//!
//! Issuer key pairs in the node's key store. `ensure` only mints new key
//! material in development mode; with `--production` it fails for any
//! issuer that has no key yet.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use urk_core::Did;
use urk_crypto::{KeyStore, KeyStoreMode};

use crate::DataPaths;

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Generate key pairs for issuers that do not have one.
    Ensure {
        /// Issuer DIDs.
        #[arg(value_name = "DID", required = true)]
        issuers: Vec<String>,

        /// Refuse to generate key material.
        #[arg(long)]
        production: bool,
    },

    /// List issuers and their public keys (hex).
    List,
}

pub fn run_keys(args: &KeysArgs, paths: &DataPaths) -> Result<u8> {
    match &args.command {
        KeysCommand::Ensure { issuers, production } => {
            let mode = if *production {
                KeyStoreMode::Production
            } else {
                KeyStoreMode::Development
            };
            cmd_ensure(paths, issuers, mode)
        }
        KeysCommand::List => cmd_list(paths),
    }
}

fn cmd_ensure(paths: &DataPaths, issuers: &[String], mode: KeyStoreMode) -> Result<u8> {
    let dids = issuers
        .iter()
        .map(|s| Did::new(s.as_str()).with_context(|| format!("invalid issuer DID: {s}")))
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = paths.keystore_path().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let store = open(paths, mode)?;
    let created = store.ensure(&dids).context("key generation failed")?;

    for did in &dids {
        let status = if created.contains(did) { "generated" } else { "exists" };
        println!("{status:>9}  {did}");
    }
    println!("OK: {} issuer(s), {} new", dids.len(), created.len());
    Ok(0)
}

fn cmd_list(paths: &DataPaths) -> Result<u8> {
    let store = open(paths, KeyStoreMode::Production)?;
    let issuers = store.issuers();
    if issuers.is_empty() {
        println!("no issuer keys in {}", paths.keystore_path().display());
        return Ok(0);
    }
    for did in issuers {
        let public = store
            .public_key(&did)
            .map(|k| k.to_hex())
            .unwrap_or_default();
        println!("{did}  {public}");
    }
    Ok(0)
}

fn open(paths: &DataPaths, mode: KeyStoreMode) -> Result<KeyStore> {
    let path = paths.keystore_path();
    KeyStore::open(&path, mode).with_context(|| format!("failed to open key store: {}", path.display()))
}
