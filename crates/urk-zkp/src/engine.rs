//! # Solvency Proof Engine
//!
//! `generate_solvency_proof` enforces, in order:
//!
//! 1. the witness carries assets, liabilities, and a firm commitment;
//! 2. `assets - liabilities >= threshold(tier)`;
//! 3. a nullifier can be derived from the subject DID and salt.
//!
//! Only then is the proof backend invoked. Verification is structural: the
//! protocol tag must be `PLONK` and a nullifier must be present.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use urk_core::{sha256_text, Timestamp};

use crate::error::ZkError;
use crate::mock::{MockPlonkSystem, PROTOCOL};
use crate::nullifier::derive_nullifier;
use crate::traits::ProofSystem;

pub const DEFAULT_TIER: &str = "TIER_1M";

/// Threshold in USD for a named tier. Unknown tiers get the `TIER_1M`
/// threshold.
pub fn tier_threshold(tier: &str) -> u64 {
    match tier {
        "TIER_10M" => 10_000_000,
        "TIER_50M" => 50_000_000,
        _ => 1_000_000,
    }
}

/// Private solvency inputs. Never serialized into a credential.
#[derive(Clone, Default, Deserialize)]
pub struct SolvencyWitness {
    pub assets: Option<u64>,
    pub liabilities: Option<u64>,
    /// Issuer-side signature over the witness figures.
    pub commitment: Option<String>,
    pub subject_did: Option<String>,
    pub salt: Option<String>,
    pub issuer_did: Option<String>,
}

impl std::fmt::Debug for SolvencyWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolvencyWitness")
            .field("assets", &self.assets.map(|_| "[REDACTED]"))
            .field("liabilities", &self.liabilities.map(|_| "[REDACTED]"))
            .field("commitment", &self.commitment.is_some())
            .field("subject_did", &self.subject_did)
            .field("salt", &self.salt.as_ref().map(|_| "[REDACTED]"))
            .field("issuer_did", &self.issuer_did)
            .finish()
    }
}

/// Proof payload as emitted by a [`ProofSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyProof {
    pub protocol: String,
    pub curve: String,
    pub pi_a: [String; 2],
    pub pi_b: [[String; 2]; 2],
    pub pi_c: [String; 2],
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSignals {
    pub nullifier: String,
    pub tier: String,
    /// Decimal string; circuits work in field elements, not JSON numbers.
    pub threshold: String,
    pub issuer_pubkey_hash: String,
}

/// What gets embedded under `credentialSubject.zkSolvency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvencyProofBundle {
    pub proof: SolvencyProof,
    #[serde(rename = "publicSignals")]
    pub public_signals: PublicSignals,
}

#[derive(Clone)]
pub struct ZkProofEngine {
    system: Arc<dyn ProofSystem>,
}

impl ZkProofEngine {
    pub fn new(system: Arc<dyn ProofSystem>) -> Self {
        Self { system }
    }

    pub fn generate_solvency_proof(
        &self,
        witness: &SolvencyWitness,
        tier: &str,
    ) -> Result<SolvencyProofBundle, ZkError> {
        let assets = witness.assets.ok_or(ZkError::InvalidWitness("assets"))?;
        let liabilities = witness.liabilities.ok_or(ZkError::InvalidWitness("liabilities"))?;
        let commitment = witness
            .commitment
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(ZkError::InvalidWitness("commitment"))?;

        let threshold = tier_threshold(tier);
        let net_worth = i128::from(assets) - i128::from(liabilities);
        if net_worth < i128::from(threshold) {
            tracing::info!(tier, threshold, "solvency threshold not met");
            return Err(ZkError::SolvencyCheckFailed {
                tier: tier.to_string(),
                threshold,
            });
        }

        let nullifier = derive_nullifier(
            witness.subject_did.as_deref().unwrap_or_default(),
            witness.salt.as_deref().unwrap_or_default(),
        )?;

        let signals = PublicSignals {
            nullifier,
            tier: tier.to_string(),
            threshold: threshold.to_string(),
            issuer_pubkey_hash: sha256_text(witness.issuer_did.as_deref().unwrap_or("unknown")),
        };
        let proof = self.system.prove(&signals, commitment)?;

        Ok(SolvencyProofBundle {
            proof,
            public_signals: signals,
        })
    }

    /// Structural check on an untrusted bundle (e.g. lifted from a credential).
    pub fn verify_solvency_proof(&self, bundle: &serde_json::Value) -> bool {
        let protocol_ok = bundle
            .pointer("/proof/protocol")
            .and_then(|p| p.as_str())
            .is_some_and(|p| p == PROTOCOL);
        let has_nullifier = bundle
            .pointer("/publicSignals/nullifier")
            .and_then(|n| n.as_str())
            .is_some_and(|n| !n.is_empty());
        protocol_ok && has_nullifier
    }
}

impl Default for ZkProofEngine {
    fn default() -> Self {
        Self::new(Arc::new(MockPlonkSystem))
    }
}

impl std::fmt::Debug for ZkProofEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkProofEngine")
            .field("protocol", &self.system.protocol())
            .field("curve", &self.system.curve())
            .finish()
    }
}
