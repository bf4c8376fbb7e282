//! # Node Bootstrap
//!
//! Builds [`AppState`] from a [`NodeConfig`]:
//!
//! 1. **Key store**: open, then `ensure` every `ISSUER_DIDS` entry. New key
//!    material is only minted in development mode.
//! 2. **Ledger**: open and verify the chain. A broken chain fails bootstrap.
//! 3. **Policy**: trust matrix, subject schemas, provider registry.
//! 4. **Revocation store**: HTTP when `REVOCATION_URL` is set, else file.
//! 5. **Engines**: issuer and verifier over the shared handles.
//!
//! Corruption found at any step stops the node. Nothing is auto-repaired.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use urk_crypto::{KeyStore, KeystoreError};
use urk_ledger::{ComplianceLedger, LedgerError};
use urk_policy::{
    AuditSampler, FileRevocationStore, HttpRevocationStore, RegistryError, RevocationError, RevocationRegistry,
    RevocationStore, SchemaError, SchemaRegistry, TrustMatrix, TrustRegistry,
};
use urk_vc::{CredentialIssuer, CredentialVerifier};
use urk_zkp::ZkProofEngine;

use crate::config::{Environment, NodeConfig};
use crate::state::AppState;

const REVOCATION_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("cannot create data directory {path}: {source}")]
    DataDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("key store: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("trust configuration: {0}")]
    Registry(#[from] RegistryError),

    #[error("schemas: {0}")]
    Schema(#[from] SchemaError),

    #[error("revocation store: {0}")]
    Revocation(#[from] RevocationError),
}

pub fn bootstrap(config: NodeConfig) -> Result<AppState, BootstrapError> {
    ensure_dir(&config.data_dir)?;

    let keystore = Arc::new(KeyStore::open(&config.keystore_path, config.keystore_mode())?);
    if config.issuer_dids.is_empty() {
        tracing::warn!("ISSUER_DIDS is empty; only issuers already in the key store can sign");
    }
    let created = keystore.ensure(&config.issuer_dids)?;
    for did in &created {
        tracing::info!(issuer = %did, "generated issuer key pair");
    }

    let ledger = Arc::new(ComplianceLedger::open(&config.ledger_path)?);

    let trust = Arc::new(TrustMatrix::load(&config.trust_registry_path)?);
    let schemas = Arc::new(SchemaRegistry::load_dir(&config.schema_dir)?);
    let providers = Arc::new(TrustRegistry::load(
        &config.issuer_dids,
        config.providers_path.as_deref(),
        &keystore.issuers(),
    )?);

    let store: Arc<dyn RevocationStore> = match &config.revocation_url {
        Some(url) => Arc::new(HttpRevocationStore::new(
            url.clone(),
            config.revocation_token.clone(),
            REVOCATION_HTTP_TIMEOUT,
        )?),
        None => Arc::new(FileRevocationStore::open(&config.revocation_path)?),
    };
    let revocations = Arc::new(RevocationRegistry::new(store));

    let zk = ZkProofEngine::default();
    let issuer = CredentialIssuer::new(keystore.clone(), ledger.clone(), zk.clone());
    let verifier = CredentialVerifier::new(
        trust,
        schemas,
        keystore.clone(),
        revocations.clone(),
        ledger.clone(),
    );

    log_banner(&config, &keystore, &ledger, &providers);

    Ok(AppState {
        config: Arc::new(config),
        keystore,
        ledger,
        providers,
        revocations,
        sampler: AuditSampler::new(),
        zk,
        issuer,
        verifier,
    })
}

fn ensure_dir(path: &Path) -> Result<(), BootstrapError> {
    std::fs::create_dir_all(path).map_err(|source| BootstrapError::DataDir {
        path: path.display().to_string(),
        source,
    })
}

fn log_banner(config: &NodeConfig, keystore: &KeyStore, ledger: &ComplianceLedger, providers: &TrustRegistry) {
    let revocation_backend = if config.revocation_url.is_some() { "http" } else { "file" };
    tracing::info!(
        environment = ?config.environment,
        issuers = keystore.issuers().len(),
        providers = providers.len(),
        ledger_blocks = ledger.len(),
        revocation_backend,
        strict_mode = config.strict_mode,
        "node bootstrapped"
    );
    tracing::warn!("solvency proofs use the mock proof system and carry no cryptographic soundness");
    if config.environment == Environment::Development {
        tracing::warn!("running in development mode; issuer keys may be generated on demand");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urk_core::Did;
    use urk_crypto::KeyStoreMode;

    fn did(s: &str) -> Did {
        Did::new(s).unwrap()
    }

    #[test]
    fn creates_keys_and_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::development(dir.path().join("data"));
        config.issuer_dids = vec![did("did:web:compliance.walkers.sg")];

        let state = bootstrap(config).unwrap();
        assert!(state.keystore.contains(&did("did:web:compliance.walkers.sg")));
        assert_eq!(state.ledger.len(), 1);
        assert!(state.providers.get_provider("did:web:compliance.walkers.sg").is_some());
        assert!(dir.path().join("data/keystore.json").exists());
        assert!(dir.path().join("data/global_compliance_ledger.json").exists());
    }

    #[test]
    fn production_refuses_new_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::development(dir.path());
        config.environment = Environment::Production;
        config.issuer_dids = vec![did("did:web:compliance.walkers.sg")];
        assert_eq!(config.keystore_mode(), KeyStoreMode::Production);

        let err = bootstrap(config).unwrap_err();
        assert!(matches!(err, BootstrapError::Keystore(KeystoreError::KeyGenerationForbidden(_))));
    }

    #[test]
    fn corrupt_ledger_blocks_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig::development(dir.path());
        let ledger_path = config.ledger_path.clone();
        drop(bootstrap(config.clone()).unwrap());

        let raw = std::fs::read_to_string(&ledger_path).unwrap();
        let mut blocks: serde_json::Value = serde_json::from_str(&raw).unwrap();
        blocks[0]["data_hash"] = serde_json::json!("0".repeat(64));
        std::fs::write(&ledger_path, serde_json::to_vec(&blocks).unwrap()).unwrap();

        let err = bootstrap(config).unwrap_err();
        assert!(matches!(err, BootstrapError::Ledger(LedgerError::Corruption { sequence: 0 })));
    }

    #[test]
    fn corrupt_keystore_blocks_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig::development(dir.path());
        std::fs::write(&config.keystore_path, b"{not json").unwrap();
        let err = bootstrap(config).unwrap_err();
        assert!(matches!(err, BootstrapError::Keystore(KeystoreError::KeystoreCorruption { .. })));
    }

    #[test]
    fn keystore_issuers_become_providers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::development(dir.path());
        config.issuer_dids = vec![did("did:web:kyc.emirates-id.ae")];
        drop(bootstrap(config.clone()).unwrap());

        config.issuer_dids.clear();
        let state = bootstrap(config).unwrap();
        let provider = state.providers.get_provider("did:web:kyc.emirates-id.ae").unwrap();
        assert_eq!(provider.jurisdiction.as_deref(), Some("AE"));
    }
}
