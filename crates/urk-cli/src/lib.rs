//! # urk-cli — Operator CLI for the Universal Reliance Kernel
//!
//! Works directly on a node's data directory; the node does not need to be
//! running. When it is, ledger appends and revocations from both sides go
//! through the same file locks and neither overwrites the other.
//!
//! ## Subcommands
//!
//! - `urk keys ensure <DID>...` / `urk keys list`: issuer key pairs.
//! - `urk ledger verify` / `urk ledger show`: compliance ledger.
//! - `urk revocation revoke <ID>` / `urk revocation status <ID>`.
//!
//! ```bash
//! urk --data-dir /srv/urk keys ensure did:web:compliance.walkers.sg
//! urk ledger verify
//! ```

pub mod keys;
pub mod ledger;
pub mod revocation;

use std::path::{Path, PathBuf};

use clap::Args;

/// File locations shared by every subcommand. Defaults match the node.
#[derive(Args, Debug, Clone)]
pub struct DataPaths {
    /// Node data directory.
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Key store file (default: <data-dir>/keystore.json).
    #[arg(long, global = true)]
    pub keystore: Option<PathBuf>,

    /// Ledger file (default: <data-dir>/global_compliance_ledger.json).
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Revocation store file (default: <data-dir>/revocation_registry.json).
    #[arg(long, global = true)]
    pub revocations: Option<PathBuf>,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            keystore: None,
            ledger: None,
            revocations: None,
        }
    }

    pub fn keystore_path(&self) -> PathBuf {
        resolve(&self.keystore, &self.data_dir, "keystore.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        resolve(&self.ledger, &self.data_dir, "global_compliance_ledger.json")
    }

    pub fn revocation_path(&self) -> PathBuf {
        resolve(&self.revocations, &self.data_dir, "revocation_registry.json")
    }
}

fn resolve(explicit: &Option<PathBuf>, data_dir: &Path, default: &str) -> PathBuf {
    explicit.clone().unwrap_or_else(|| data_dir.join(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_default_under_data_dir() {
        let paths = DataPaths::new("/srv/urk");
        assert_eq!(paths.keystore_path(), PathBuf::from("/srv/urk/keystore.json"));
        assert_eq!(paths.ledger_path(), PathBuf::from("/srv/urk/global_compliance_ledger.json"));
    }

    #[test]
    fn explicit_path_wins() {
        let mut paths = DataPaths::new("/srv/urk");
        paths.revocations = Some(PathBuf::from("/tmp/revoked.json"));
        assert_eq!(paths.revocation_path(), PathBuf::from("/tmp/revoked.json"));
    }
}
