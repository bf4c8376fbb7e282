//! # Global Passport Credential
//!
//! The signed document returned by issuance and presented at verification.
//!
//! ## Security Invariants
//!
//! - The signing input is the JCS canonicalization of the credential with
//!   the `proof` member removed ([`Credential::signing_input`]). Signing the
//!   full document, proof included, never verifies.
//! - The envelope is rigid (`deny_unknown_fields`); `credentialSubject` is
//!   an open attribute map.
//! - Any float anywhere in the document makes canonicalization fail, so a
//!   float-bearing credential can neither be signed nor verified.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use urk_core::{CanonicalBytes, CanonicalizationError, Timestamp};

use crate::proof::Proof;

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const VC_TYPE: &str = "VerifiableCredential";
pub const PASSPORT_TYPE: &str = "GlobalPassport";
pub const EVIDENCE_TYPE: &str = "ComplianceAuditRecord";

#[derive(Debug, thiserror::Error)]
pub enum VcError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cross-reference to the ledger block written at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Evidence {
    /// `urn:ledger:<block_hash>`.
    pub id: String,
    #[serde(rename = "type")]
    pub evidence_type: String,
    pub verifier: String,
}

impl Evidence {
    pub fn ledger_record(block_hash: &str, issuer: &str) -> Self {
        Self {
            id: format!("urn:ledger:{block_hash}"),
            evidence_type: EVIDENCE_TYPE.to_string(),
            verifier: issuer.to_string(),
        }
    }

    /// The block hash, if `id` is a ledger URN.
    pub fn block_hash(&self) -> Option<&str> {
        self.id.strip_prefix("urn:ledger:")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// `urn:uuid:<v4>`.
    pub id: String,

    #[serde(rename = "type")]
    pub credential_type: Vec<String>,

    /// Issuer DID. Kept as presented so an unknown or malformed issuer
    /// surfaces as a policy verdict rather than a parse failure.
    pub issuer: String,

    #[serde(rename = "issuanceDate")]
    pub issuance_date: Timestamp,

    #[serde(rename = "credentialSubject")]
    pub credential_subject: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl Credential {
    /// Unsigned passport envelope.
    pub fn new_passport(
        id: String,
        issuer: String,
        issuance_date: Timestamp,
        credential_subject: Map<String, Value>,
        evidence: Vec<Evidence>,
    ) -> Self {
        Self {
            context: vec![CREDENTIALS_V1_CONTEXT.to_string(), ED25519_2020_CONTEXT.to_string()],
            id,
            credential_type: vec![VC_TYPE.to_string(), PASSPORT_TYPE.to_string()],
            issuer,
            issuance_date,
            credential_subject,
            evidence,
            proof: None,
        }
    }

    /// Canonical bytes of the document with `proof` removed.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("proof");
        }
        Ok(CanonicalBytes::new(&value)?)
    }

    /// `credentialSubject.trustScore` if it is an integer.
    pub fn trust_score(&self) -> Option<i64> {
        self.credential_subject.get("trustScore").and_then(Value::as_i64)
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }
}
