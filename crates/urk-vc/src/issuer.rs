//! # Credential Issuance
//!
//! `issue` runs a fixed sequence:
//!
//! ```text
//! key-check → ledger ISSUANCE_ATTEMPT → witness → proof (optional)
//!           → subject assembly → selective disclosure → sign
//! ```
//!
//! The ledger entry is written before anything that can fail on the
//! caller's input, so a rejected solvency attempt still leaves an audit
//! record. Nothing is signed until every earlier step has succeeded; a
//! failed step never yields a partial credential.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use serde_json::{Map, Value};
use urk_core::{CanonicalBytes, CanonicalizationError, CredentialId, Did, JurisdictionId, Timestamp};
use urk_crypto::{KeyStore, KeystoreError};
use urk_ledger::{ComplianceLedger, EventType, LedgerError};
use urk_zkp::{SolvencyProofBundle, SolvencyWitness, ZkError, ZkProofEngine, DEFAULT_TIER};

use crate::credential::{Credential, Evidence, VcError};
use crate::disclosure::apply_disclosure;
use crate::iso20022::apply_party_mapping;
use crate::proof::Proof;

pub const DEFAULT_TRUST_SCORE: i64 = 99;
pub const DEFAULT_COMPLIANCE_LEVEL: &str = "GOLD";
const SOLVENCY_FIELD: &str = "zkSolvency";

#[derive(Debug, thiserror::Error)]
pub enum IssuanceError {
    #[error("issuer {0} has no signing key")]
    UnknownIssuer(String),

    #[error(transparent)]
    Solvency(#[from] ZkError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("key store error: {0}")]
    Keystore(#[from] KeystoreError),

    #[error("credential error: {0}")]
    Credential(#[from] VcError),
}

impl From<CanonicalizationError> for IssuanceError {
    fn from(e: CanonicalizationError) -> Self {
        Self::Credential(VcError::Canonicalization(e))
    }
}

/// Solvency inputs for an optional `zkSolvency` attachment.
#[derive(Clone, Default)]
pub struct SolvencyRequest {
    pub assets: Option<u64>,
    pub liabilities: Option<u64>,
    pub tier: Option<String>,
    /// Nullifier salt. 32 random bytes (hex) when absent.
    pub salt: Option<String>,
}

impl std::fmt::Debug for SolvencyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolvencyRequest")
            .field("assets", &self.assets.map(|_| "[REDACTED]"))
            .field("liabilities", &self.liabilities.map(|_| "[REDACTED]"))
            .field("tier", &self.tier)
            .field("salt", &self.salt.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct IssuanceRequest {
    pub issuer: Did,
    /// Subject identity. `did:example:<uuid>` when absent.
    pub subject_did: Option<Did>,
    /// KYC attributes (`legalName`, `nationality`, ...).
    pub attributes: Map<String, Value>,
    pub jurisdiction_metadata: Map<String, Value>,
    /// Requested subject fields. `None` discloses everything.
    pub disclosure: Option<Vec<String>>,
    pub trust_score: i64,
    pub compliance_level: String,
    /// Add ISO 20022 `Nm` / `PstlAdr` party fields.
    pub iso20022: bool,
    pub solvency: Option<SolvencyRequest>,
}

impl IssuanceRequest {
    pub fn new(issuer: Did) -> Self {
        Self {
            issuer,
            subject_did: None,
            attributes: Map::new(),
            jurisdiction_metadata: Map::new(),
            disclosure: None,
            trust_score: DEFAULT_TRUST_SCORE,
            compliance_level: DEFAULT_COMPLIANCE_LEVEL.to_string(),
            iso20022: false,
            solvency: None,
        }
    }
}

#[derive(Serialize)]
struct IssuanceEvent<'a> {
    issuer: &'a str,
    subject: &'a str,
    credential_id: &'a str,
}

/// Figures the issuer commits to by signing them.
#[derive(Serialize)]
struct WitnessCommitment<'a> {
    assets: Option<u64>,
    liabilities: Option<u64>,
    subject_did: &'a str,
}

#[derive(Clone)]
pub struct CredentialIssuer {
    keystore: Arc<KeyStore>,
    ledger: Arc<ComplianceLedger>,
    zk: ZkProofEngine,
}

impl CredentialIssuer {
    pub fn new(keystore: Arc<KeyStore>, ledger: Arc<ComplianceLedger>, zk: ZkProofEngine) -> Self {
        Self { keystore, ledger, zk }
    }

    pub fn issue(&self, request: IssuanceRequest) -> Result<Credential, IssuanceError> {
        let issuer = &request.issuer;
        if !self.keystore.contains(issuer) {
            return Err(IssuanceError::UnknownIssuer(issuer.to_string()));
        }

        let credential_id = CredentialId::new().to_string();
        let subject_did = request.subject_did.clone().unwrap_or_else(Did::generate_example);

        let jurisdiction = JurisdictionId::from_issuer(issuer);
        let audit_hash = self.ledger.append(
            EventType::IssuanceAttempt,
            &IssuanceEvent {
                issuer: issuer.as_str(),
                subject: subject_did.as_str(),
                credential_id: &credential_id,
            },
            jurisdiction.as_ref(),
        )?;

        let solvency = match &request.solvency {
            Some(solvency) => Some(self.solvency_proof(issuer, &subject_did, solvency)?),
            None => None,
        };

        let subject = assemble_subject(&request, &subject_did, solvency)?;

        let mut credential = Credential::new_passport(
            credential_id,
            issuer.to_string(),
            Timestamp::now(),
            subject,
            vec![Evidence::ledger_record(&audit_hash, issuer.as_str())],
        );
        let signature = self.keystore.sign(issuer, &credential.signing_input()?)?;
        credential.proof = Some(Proof::new_ed25519(issuer.key_id(), signature.to_hex()));

        tracing::info!(
            issuer = %issuer,
            credential_id = %credential.id,
            solvency = request.solvency.is_some(),
            "credential issued"
        );
        Ok(credential)
    }

    fn solvency_proof(
        &self,
        issuer: &Did,
        subject_did: &Did,
        solvency: &SolvencyRequest,
    ) -> Result<SolvencyProofBundle, IssuanceError> {
        let commitment = self.keystore.sign(
            issuer,
            &CanonicalBytes::new(&WitnessCommitment {
                assets: solvency.assets,
                liabilities: solvency.liabilities,
                subject_did: subject_did.as_str(),
            })?,
        )?;
        let witness = SolvencyWitness {
            assets: solvency.assets,
            liabilities: solvency.liabilities,
            commitment: Some(commitment.to_hex()),
            subject_did: Some(subject_did.to_string()),
            salt: Some(solvency.salt.clone().unwrap_or_else(random_salt)),
            issuer_did: Some(issuer.to_string()),
        };
        let tier = solvency.tier.as_deref().unwrap_or(DEFAULT_TIER);
        Ok(self.zk.generate_solvency_proof(&witness, tier)?)
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("keystore", &self.keystore)
            .field("ledger_len", &self.ledger.len())
            .finish()
    }
}

/// Attributes, then jurisdiction metadata, then ISO fields; mandatory fields
/// overwrite whatever came before them. Disclosure filtering runs last.
fn assemble_subject(
    request: &IssuanceRequest,
    subject_did: &Did,
    solvency: Option<SolvencyProofBundle>,
) -> Result<Map<String, Value>, IssuanceError> {
    let mut subject = request.attributes.clone();
    subject.extend(request.jurisdiction_metadata.clone());
    if request.iso20022 {
        apply_party_mapping(&mut subject);
    }
    subject.insert("id".into(), Value::String(subject_did.to_string()));
    subject.insert("trustScore".into(), Value::from(request.trust_score));
    subject.insert("complianceLevel".into(), Value::String(request.compliance_level.clone()));

    let has_proof = solvency.is_some();
    if let Some(bundle) = solvency {
        subject.insert(SOLVENCY_FIELD.into(), serde_json::to_value(bundle).map_err(VcError::from)?);
    }

    Ok(match &request.disclosure {
        Some(requested) => {
            let implicit: &[&str] = if has_proof { &[SOLVENCY_FIELD] } else { &[] };
            apply_disclosure(subject, requested, implicit)
        }
        None => subject,
    })
}

fn random_salt() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
