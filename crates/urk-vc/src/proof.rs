//! # Credential Proof
//!
//! The detached signature block. Its structure is rigid: unknown fields are
//! rejected at deserialization so nothing can ride along outside the signed
//! payload.

use serde::{Deserialize, Serialize};
use urk_core::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    Ed25519Signature2020,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519Signature2020 => f.write_str("Ed25519Signature2020"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    AssertionMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    pub created: Timestamp,

    /// `<issuer>#key-1`.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// Hex-encoded Ed25519 signature, 128 lowercase characters.
    #[serde(rename = "proofValue")]
    pub proof_value: String,
}

impl Proof {
    pub fn new_ed25519(verification_method: String, proof_value: String) -> Self {
        Self {
            proof_type: ProofType::Ed25519Signature2020,
            created: Timestamp::now(),
            verification_method,
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value,
        }
    }
}
