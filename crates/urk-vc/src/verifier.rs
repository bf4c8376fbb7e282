//! # Credential Verification
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! | # | Check      | Failure               |
//! |---|------------|-----------------------|
//! | 1 | trust      | `ISSUER_NOT_TRUSTED`  |
//! | 2 | schema     | `SCHEMA_MISMATCH`     |
//! | 3 | key lookup | `ISSUER_UNKNOWN`      |
//! | 3 | signature  | `INVALID_SIGNATURE`   |
//! | 4 | revocation | `CREDENTIAL_REVOKED`  |
//!
//! A policy failure is a [`Verdict::Rejected`], not an error. [`VerifyError`]
//! is reserved for infrastructure failures (revocation store unreachable,
//! ledger not writable); those never produce a verdict at all.
//!
//! Only a fully successful run writes a `VERIFICATION` ledger event. Audit
//! sampling is the caller's business and happens after a `Verified` verdict.

use std::sync::Arc;

use serde::Serialize;
use urk_core::{Did, JurisdictionId};
use urk_crypto::{Ed25519Signature, KeyStore, KeystoreError};
use urk_ledger::{ComplianceLedger, EventType, LedgerError};
use urk_policy::{RevocationError, RevocationRegistry, SchemaRegistry, TrustMatrix};

use crate::credential::Credential;

pub const STATUS_ACTIVE: &str = "ACTIVE";

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("revocation lookup failed: {0}")]
    Revocation(#[from] RevocationError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    IssuerNotTrusted,
    SchemaMismatch,
    IssuerUnknown,
    InvalidSignature,
    CredentialRevoked,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuerNotTrusted => "ISSUER_NOT_TRUSTED",
            Self::SchemaMismatch => "SCHEMA_MISMATCH",
            Self::IssuerUnknown => "ISSUER_UNKNOWN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::CredentialRevoked => "CREDENTIAL_REVOKED",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: FailureReason,
    pub detail: String,
}

impl Rejection {
    fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCredential {
    pub credential_id: String,
    pub issuer: String,
    /// `credentialSubject.trustScore` when it is an integer.
    pub trust_score: Option<i64>,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Verified(VerifiedCredential),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            Self::Verified(_) => None,
        }
    }
}

#[derive(Serialize)]
struct VerificationEvent {
    credential_id: String,
    verifier: String,
    result: &'static str,
}

#[derive(Clone)]
pub struct CredentialVerifier {
    trust: Arc<TrustMatrix>,
    schemas: Arc<SchemaRegistry>,
    keystore: Arc<KeyStore>,
    revocations: Arc<RevocationRegistry>,
    ledger: Arc<ComplianceLedger>,
}

impl CredentialVerifier {
    pub fn new(
        trust: Arc<TrustMatrix>,
        schemas: Arc<SchemaRegistry>,
        keystore: Arc<KeyStore>,
        revocations: Arc<RevocationRegistry>,
        ledger: Arc<ComplianceLedger>,
    ) -> Self {
        Self {
            trust,
            schemas,
            keystore,
            revocations,
            ledger,
        }
    }

    pub async fn verify(&self, credential: &Credential, jurisdiction: &JurisdictionId) -> Result<Verdict, VerifyError> {
        let checks = self
            .check_trust(credential, jurisdiction)
            .and_then(|()| self.check_schema(credential, jurisdiction))
            .and_then(|()| self.check_signature(credential));
        let outcome = match checks {
            Ok(()) => self.check_revocation(credential).await?,
            Err(rejection) => Err(rejection),
        };

        if let Err(rejection) = outcome {
            tracing::warn!(
                credential_id = %credential.id,
                issuer = %credential.issuer,
                jurisdiction = %jurisdiction,
                reason = %rejection.reason,
                detail = %rejection.detail,
                "verification rejected"
            );
            return Ok(Verdict::Rejected(rejection));
        }

        Arc::clone(&self.ledger)
            .append_async(
                EventType::Verification,
                VerificationEvent {
                    credential_id: credential.id.clone(),
                    verifier: jurisdiction.to_string(),
                    result: "SUCCESS",
                },
                Some(jurisdiction.clone()),
            )
            .await?;
        tracing::info!(credential_id = %credential.id, jurisdiction = %jurisdiction, "credential verified");

        Ok(Verdict::Verified(VerifiedCredential {
            credential_id: credential.id.clone(),
            issuer: credential.issuer.clone(),
            trust_score: credential.trust_score(),
            status: STATUS_ACTIVE,
        }))
    }

    fn check_trust(&self, credential: &Credential, jurisdiction: &JurisdictionId) -> Result<(), Rejection> {
        if self.trust.is_trusted(jurisdiction, &credential.issuer) {
            Ok(())
        } else {
            Err(Rejection::new(
                FailureReason::IssuerNotTrusted,
                format!("Issuer not trusted in {jurisdiction}"),
            ))
        }
    }

    fn check_schema(&self, credential: &Credential, jurisdiction: &JurisdictionId) -> Result<(), Rejection> {
        self.schemas
            .check(jurisdiction, &credential.credential_subject)
            .map_err(|v| Rejection::new(FailureReason::SchemaMismatch, v.to_string()))
    }

    fn check_signature(&self, credential: &Credential) -> Result<(), Rejection> {
        let issuer = Did::new(credential.issuer.as_str())
            .ok()
            .filter(|did| self.keystore.contains(did))
            .ok_or_else(|| Rejection::new(FailureReason::IssuerUnknown, "Issuer Unknown (Key not found)"))?;

        let invalid = |detail: &str| Rejection::new(FailureReason::InvalidSignature, detail);
        let proof = credential.proof.as_ref().ok_or_else(|| invalid("credential has no proof"))?;
        if proof.verification_method != issuer.key_id() {
            return Err(invalid("verification method does not belong to issuer"));
        }
        let signature = Ed25519Signature::from_hex(&proof.proof_value).map_err(|_| invalid("malformed proof value"))?;
        let payload = credential
            .signing_input()
            .map_err(|_| invalid("credential cannot be canonicalized"))?;

        match self.keystore.verify(&issuer, &payload, &signature) {
            Ok(true) => Ok(()),
            Ok(false) => Err(invalid("Cryptographic signature invalid")),
            Err(KeystoreError::UnknownIssuer(_)) => {
                Err(Rejection::new(FailureReason::IssuerUnknown, "Issuer Unknown (Key not found)"))
            }
            Err(_) => Err(invalid("Cryptographic signature invalid")),
        }
    }

    async fn check_revocation(&self, credential: &Credential) -> Result<Result<(), Rejection>, VerifyError> {
        Ok(match self.revocations.reason(&credential.id).await? {
            Some(reason) => Err(Rejection::new(
                FailureReason::CredentialRevoked,
                format!("Credential revoked: {reason}"),
            )),
            None => Ok(()),
        })
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("keystore", &self.keystore)
            .field("revocations", &self.revocations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{CredentialIssuer, IssuanceRequest};
    use serde_json::json;
    use urk_crypto::KeyStoreMode;
    use urk_policy::SubjectSchema;
    use urk_zkp::ZkProofEngine;

    const WALKERS: &str = "did:web:compliance.walkers.sg";
    const EMIRATES: &str = "did:web:kyc.emirates-id.ae";

    struct Fixture {
        issuer: CredentialIssuer,
        keystore: Arc<KeyStore>,
        ledger: Arc<ComplianceLedger>,
        revocations: Arc<RevocationRegistry>,
        schemas: SchemaRegistry,
        trust: TrustMatrix,
    }

    impl Fixture {
        fn new() -> Self {
            let keystore = Arc::new(KeyStore::in_memory(KeyStoreMode::Development));
            keystore
                .ensure(&[Did::new(WALKERS).unwrap(), Did::new(EMIRATES).unwrap()])
                .unwrap();
            let ledger = Arc::new(ComplianceLedger::in_memory());
            Self {
                issuer: CredentialIssuer::new(keystore.clone(), ledger.clone(), ZkProofEngine::default()),
                keystore,
                ledger,
                revocations: Arc::new(RevocationRegistry::in_memory()),
                schemas: SchemaRegistry::default(),
                trust: TrustMatrix::from_entries([
                    ("SG", vec![WALKERS]),
                    ("UAE", vec!["*"]),
                    ("KY", vec![EMIRATES]),
                ]),
            }
        }

        fn verifier(&self) -> CredentialVerifier {
            CredentialVerifier::new(
                Arc::new(self.trust.clone()),
                Arc::new(self.schemas.clone()),
                self.keystore.clone(),
                self.revocations.clone(),
                self.ledger.clone(),
            )
        }

        fn issue(&self, issuer: &str) -> Credential {
            let mut req = IssuanceRequest::new(Did::new(issuer).unwrap());
            req.attributes = json!({"legalName": "Alice Tan", "nationality": "SG"})
                .as_object()
                .cloned()
                .unwrap();
            req.iso20022 = true;
            self.issuer.issue(req).unwrap()
        }
    }

    fn j(code: &str) -> JurisdictionId {
        JurisdictionId::new(code).unwrap()
    }

    fn reason(verdict: &Verdict) -> FailureReason {
        verdict.rejection().expect("expected rejection").reason
    }

    #[tokio::test]
    async fn test_round_trip_verifies() {
        let fx = Fixture::new();
        let cred = fx.issue(WALKERS);
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        match verdict {
            Verdict::Verified(v) => {
                assert_eq!(v.issuer, WALKERS);
                assert_eq!(v.trust_score, Some(99));
                assert_eq!(v.status, "ACTIVE");
                assert_eq!(v.credential_id, cred.id);
            }
            other => panic!("expected verified, got {other:?}"),
        }
        let tip = fx.ledger.tip().unwrap();
        assert_eq!(tip.event_type, EventType::Verification);
        assert_eq!(tip.jurisdiction.as_deref(), Some("SG"));
    }

    #[tokio::test]
    async fn test_wildcard_trust() {
        let fx = Fixture::new();
        let cred = fx.issue(EMIRATES);
        assert!(fx.verifier().verify(&cred, &j("UAE")).await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_untrusted_issuer_despite_valid_signature() {
        let fx = Fixture::new();
        let cred = fx.issue(EMIRATES);
        let before = fx.ledger.len();
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::IssuerNotTrusted);
        assert_eq!(fx.ledger.len(), before);
    }

    #[tokio::test]
    async fn test_unlisted_jurisdiction_trusts_nobody() {
        let fx = Fixture::new();
        let cred = fx.issue(WALKERS);
        let verdict = fx.verifier().verify(&cred, &j("PK")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::IssuerNotTrusted);
    }

    #[tokio::test]
    async fn test_tampered_subject_is_invalid_signature() {
        let fx = Fixture::new();
        let mut cred = fx.issue(WALKERS);
        cred.credential_subject.insert("legalName".into(), json!("Mallory"));
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::InvalidSignature);
    }

    #[tokio::test]
    async fn test_missing_proof_is_invalid_signature() {
        let fx = Fixture::new();
        let mut cred = fx.issue(WALKERS);
        cred.proof = None;
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::InvalidSignature);
    }

    #[tokio::test]
    async fn test_malformed_proof_value_is_invalid_signature() {
        let fx = Fixture::new();
        let mut cred = fx.issue(WALKERS);
        if let Some(p) = cred.proof.as_mut() {
            p.proof_value = "zz".repeat(64);
        }
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::InvalidSignature);
    }

    #[tokio::test]
    async fn test_foreign_verification_method_rejected() {
        let fx = Fixture::new();
        let mut cred = fx.issue(WALKERS);
        if let Some(p) = cred.proof.as_mut() {
            p.verification_method = format!("{EMIRATES}#key-1");
        }
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::InvalidSignature);
    }

    #[tokio::test]
    async fn test_signature_from_other_issuer_rejected() {
        let fx = Fixture::new();
        let genuine = fx.issue(EMIRATES);
        let mut forged = genuine.clone();
        forged.issuer = WALKERS.into();
        if let Some(p) = forged.proof.as_mut() {
            p.verification_method = format!("{WALKERS}#key-1");
        }
        let verdict = fx.verifier().verify(&forged, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::InvalidSignature);
    }

    #[tokio::test]
    async fn test_issuer_without_key_is_unknown() {
        let mut fx = Fixture::new();
        fx.trust = TrustMatrix::from_entries([("SG", vec!["*"])]);
        let mut cred = fx.issue(WALKERS);
        cred.issuer = "did:web:ghost.example.sg".into();
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::IssuerUnknown);
    }

    #[tokio::test]
    async fn test_schema_mismatch() {
        let mut fx = Fixture::new();
        let schema: SubjectSchema =
            serde_json::from_value(json!({"required": ["legalName", "taxId"]})).unwrap();
        fx.schemas.insert(&j("SG"), schema);
        let cred = fx.issue(WALKERS);
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        let rejection = verdict.rejection().unwrap();
        assert_eq!(rejection.reason, FailureReason::SchemaMismatch);
        assert_eq!(rejection.detail, "Missing required field: taxId");
    }

    #[tokio::test]
    async fn test_iso_schema_satisfied() {
        let mut fx = Fixture::new();
        let schema: SubjectSchema = serde_json::from_value(json!({
            "required": ["Nm"],
            "properties": {"Nm": {"required": ["FrstNm", "Srnm"]}}
        }))
        .unwrap();
        fx.schemas.insert(&j("SG"), schema);
        let cred = fx.issue(WALKERS);
        assert!(fx.verifier().verify(&cred, &j("SG")).await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_schema_checked_before_signature() {
        let mut fx = Fixture::new();
        let schema: SubjectSchema = serde_json::from_value(json!({"required": ["taxId"]})).unwrap();
        fx.schemas.insert(&j("SG"), schema);
        let mut cred = fx.issue(WALKERS);
        cred.proof = None;
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::SchemaMismatch);
    }

    #[tokio::test]
    async fn test_revoked_credential_rejected() {
        let fx = Fixture::new();
        let cred = fx.issue(WALKERS);
        fx.revocations.revoke(&cred.id, Some("FRAUD")).await.unwrap();
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        let rejection = verdict.rejection().unwrap();
        assert_eq!(rejection.reason, FailureReason::CredentialRevoked);
        assert!(rejection.detail.contains("FRAUD"));
    }

    #[tokio::test]
    async fn test_forged_revoked_credential_reports_signature_first() {
        let fx = Fixture::new();
        let mut cred = fx.issue(WALKERS);
        fx.revocations.revoke(&cred.id, None).await.unwrap();
        cred.credential_subject.insert("trustScore".into(), json!(100));
        let verdict = fx.verifier().verify(&cred, &j("SG")).await.unwrap();
        assert_eq!(reason(&verdict), FailureReason::InvalidSignature);
    }

    #[tokio::test]
    async fn test_reason_codes_serialize_screaming_snake() {
        assert_eq!(serde_json::to_value(FailureReason::IssuerNotTrusted).unwrap(), "ISSUER_NOT_TRUSTED");
        assert_eq!(FailureReason::CredentialRevoked.to_string(), "CREDENTIAL_REVOKED");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::issuer::{CredentialIssuer, IssuanceRequest};
    use proptest::prelude::*;
    use serde_json::Value;
    use urk_crypto::KeyStoreMode;
    use urk_zkp::ZkProofEngine;

    const WALKERS: &str = "did:web:compliance.walkers.sg";

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn any_disclosure_still_verifies(requested in prop::collection::vec(
            prop::sample::select(vec!["legalName", "nationality", "dateOfBirth", "occupation"]), 0..4)
        ) {
            let keystore = Arc::new(KeyStore::in_memory(KeyStoreMode::Development));
            keystore.ensure(&[Did::new(WALKERS).unwrap()]).unwrap();
            let ledger = Arc::new(ComplianceLedger::in_memory());
            let issuer = CredentialIssuer::new(keystore.clone(), ledger.clone(), ZkProofEngine::default());

            let mut req = IssuanceRequest::new(Did::new(WALKERS).unwrap());
            req.attributes.insert("legalName".into(), Value::from("Alice Tan"));
            req.attributes.insert("nationality".into(), Value::from("SG"));
            req.attributes.insert("dateOfBirth".into(), Value::from("1990-04-01"));
            req.disclosure = Some(requested.iter().map(|s| s.to_string()).collect());
            let cred = issuer.issue(req).unwrap();

            let expected = 3 + ["legalName", "nationality", "dateOfBirth"]
                .iter()
                .filter(|f| requested.contains(f))
                .count();
            prop_assert_eq!(cred.credential_subject.len(), expected);

            let verifier = CredentialVerifier::new(
                Arc::new(TrustMatrix::from_entries([("SG", vec![WALKERS])])),
                Arc::new(SchemaRegistry::default()),
                keystore,
                Arc::new(RevocationRegistry::in_memory()),
                ledger,
            );
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let verdict = rt.block_on(verifier.verify(&cred, &JurisdictionId::new("SG").unwrap())).unwrap();
            prop_assert!(verdict.is_verified());
        }
    }
}
