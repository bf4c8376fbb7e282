//! # Application State
//!
//! Every engine component is an explicit `Arc` handle built once by
//! [`crate::bootstrap`]. Nothing here is a process-wide static, so tests can
//! run several differently configured nodes side by side.

use std::sync::Arc;

use urk_crypto::KeyStore;
use urk_ledger::ComplianceLedger;
use urk_policy::{AuditSampler, RevocationRegistry, TrustRegistry};
use urk_vc::{CredentialIssuer, CredentialVerifier};
use urk_zkp::ZkProofEngine;

use crate::config::NodeConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NodeConfig>,
    pub keystore: Arc<KeyStore>,
    pub ledger: Arc<ComplianceLedger>,
    pub providers: Arc<TrustRegistry>,
    pub revocations: Arc<RevocationRegistry>,
    pub sampler: AuditSampler,
    pub zk: ZkProofEngine,
    pub issuer: CredentialIssuer,
    pub verifier: CredentialVerifier,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("keystore", &self.keystore)
            .field("ledger_blocks", &self.ledger.len())
            .field("providers", &self.providers.len())
            .finish()
    }
}
