//! # Passport Lifecycle Endpoints
//!
//! - `POST /v1/passport/issue`: issue a Global Passport credential.
//! - `POST /v1/passport/verify`: verify for a relying jurisdiction, then
//!   apply risk-weighted audit sampling.
//! - `POST /v1/passport/revoke`: revoke a credential id.
//! - `GET /v1/passport/revocations/{id}`: revocation status.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use urk_core::{CanonicalBytes, CanonicalizationError, Did, JurisdictionId};
use urk_ledger::EventType;
use urk_vc::{Credential, IssuanceRequest, SolvencyRequest, Verdict};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

pub const ISSUER_HEADER: &str = "x-issuer-did";
pub const JURISDICTION_HEADER: &str = "x-jurisdiction";
pub const SPOT_CHECK_MESSAGE: &str =
    "Spot Check Protocol Initiated. Please contact Administrator for manual verification.";

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IssuePassportRequest {
    pub issuer: Option<String>,
    pub legal_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub net_worth: Option<Number>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    /// Subject DID. Generated when absent.
    pub did: Option<String>,
    pub disclosure_request: Option<Vec<String>>,
    pub jurisdiction_metadata: Option<Map<String, Value>>,
    #[serde(rename = "zk_solvency")]
    pub zk_solvency: bool,
    pub assets: Option<u64>,
    pub liabilities: Option<u64>,
    pub solvency_tier: Option<String>,
    pub salt: Option<String>,
}

impl Validate for IssuePassportRequest {
    fn validate(&self) -> Result<(), String> {
        match self.legal_name.as_deref().map(str::trim) {
            Some(name) if name.chars().count() >= 2 => {}
            _ => return Err("legalName must be at least 2 characters".into()),
        }
        match self.date_of_birth.as_deref() {
            Some(dob) if dob.len() == 10 && NaiveDate::parse_from_str(dob, "%Y-%m-%d").is_ok() => {}
            _ => return Err("dateOfBirth must be a date in YYYY-MM-DD format".into()),
        }
        if !self.net_worth.as_ref().and_then(Number::as_f64).is_some_and(|n| n > 0.0) {
            return Err("netWorth must be a positive number".into());
        }
        match self.nationality.as_deref() {
            Some(n) if n.len() == 2 && n.chars().all(|c| c.is_ascii_alphabetic()) => {}
            _ => return Err("nationality must be a 2-letter ISO 3166-1 code".into()),
        }
        if let Some(did) = &self.did {
            Did::new(did.as_str()).map_err(|e| format!("did: {e}"))?;
        }
        for (key, value) in self.jurisdiction_metadata.iter().flatten() {
            if let Err(CanonicalizationError::FloatRejected(n)) = CanonicalBytes::new(value) {
                return Err(format!(
                    "jurisdictionMetadata.{key} must not contain decimal numbers (got {n}); send decimals as strings"
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssuePassportResponse {
    pub credential: Credential,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPassportRequest {
    pub credential: Credential,
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifiedBody<'a> {
    verified: bool,
    status: &'a str,
    issuer: &'a str,
    trust_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solvency_proof_valid: Option<bool>,
}

#[derive(Debug, Serialize)]
struct RejectedBody<'a> {
    verified: bool,
    reason: &'a str,
    detail: &'a str,
}

#[derive(Debug, Serialize)]
struct SpotCheckBody {
    verified: bool,
    reason: &'static str,
    message: &'static str,
    audit_ref: String,
}

#[derive(Debug, Serialize)]
struct SpotCheckEvent {
    credential_id: String,
    reason: &'static str,
    probability: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub credential_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevocationStatus {
    pub credential_id: String,
    pub revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_revoked: Option<bool>,
}

#[derive(Serialize)]
struct RevocationEvent {
    credential_id: String,
    reason: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/passport/issue", post(issue_passport))
        .route("/v1/passport/verify", post(verify_passport))
        .route("/v1/passport/revoke", post(revoke_passport))
        .route("/v1/passport/revocations/{id}", get(revocation_status))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/passport/issue
///
/// The issuer comes from the body or the `x-issuer-did` header. In strict
/// mode it must also be a registered provider.
///
/// `jurisdictionMetadata` is signed as part of the subject, and signed
/// payloads carry integers and strings only. A decimal anywhere in it is a
/// 422 naming the offending key.
async fn issue_passport(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<IssuePassportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuePassportResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let issuer = req
        .issuer
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| header_value(&headers, ISSUER_HEADER))
        .ok_or_else(|| {
            AppError::BadRequest("Missing Issuer DID. Please provide 'issuer' in body or 'x-issuer-did' header.".into())
        })?;
    let issuer = Did::new(issuer.trim())?;
    state.providers.resolve(issuer.as_str(), state.config.strict_mode)?;

    let request = build_issuance_request(issuer, req)?;
    let engine = state.issuer.clone();
    let credential = tokio::task::spawn_blocking(move || engine.issue(request))
        .await
        .map_err(|e| AppError::Internal(format!("issuance task failed: {e}")))??;

    tracing::info!(credential_id = %credential.id, issuer = %credential.issuer, "passport issued");
    Ok((StatusCode::CREATED, Json(IssuePassportResponse { credential })))
}

fn build_issuance_request(issuer: Did, req: IssuePassportRequest) -> Result<IssuanceRequest, AppError> {
    let mut request = IssuanceRequest::new(issuer);

    let mut attributes = Map::new();
    for (key, value) in [
        ("legalName", req.legal_name),
        ("dateOfBirth", req.date_of_birth),
        ("nationality", req.nationality),
        ("address", req.address),
    ] {
        if let Some(value) = value {
            attributes.insert(key.to_string(), Value::String(value));
        }
    }
    request.attributes = attributes;
    request.subject_did = req.did.as_deref().map(Did::new).transpose()?;
    request.jurisdiction_metadata = req.jurisdiction_metadata.unwrap_or_default();
    request.disclosure = req.disclosure_request;
    request.iso20022 = true;
    if req.zk_solvency {
        request.solvency = Some(SolvencyRequest {
            assets: req.assets,
            liabilities: req.liabilities,
            tier: req.solvency_tier,
            salt: req.salt,
        });
    }
    Ok(request)
}

/// POST /v1/passport/verify
///
/// A rejected verdict is a 200 with `verified: false`. A verified
/// credential may still be diverted to manual review by audit sampling,
/// which answers 403 `ROULETTE_TRIGGER`.
async fn verify_passport(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<VerifyPassportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = extract_json(body)?;

    let jurisdiction = req
        .jurisdiction
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| header_value(&headers, JURISDICTION_HEADER))
        .ok_or_else(|| {
            AppError::BadRequest(
                "Missing Target Jurisdiction. Please provide 'jurisdiction' in body or 'x-jurisdiction' header."
                    .into(),
            )
        })?;
    let jurisdiction = JurisdictionId::new(jurisdiction.trim())?;
    let credential = req.credential;

    let verified = match state.verifier.verify(&credential, &jurisdiction).await? {
        Verdict::Verified(v) => v,
        Verdict::Rejected(rejection) => {
            let body = RejectedBody {
                verified: false,
                reason: rejection.reason.as_str(),
                detail: &rejection.detail,
            };
            return Ok(Json(body).into_response());
        }
    };

    let decision = state.sampler.sample(verified.trust_score.unwrap_or(0));
    if decision.triggered {
        tracing::warn!(
            credential_id = %credential.id,
            jurisdiction = %jurisdiction,
            probability = decision.probability,
            "audit sampling triggered"
        );
        Arc::clone(&state.ledger)
            .append_async(
                EventType::AuditSamplingVerified,
                SpotCheckEvent {
                    credential_id: credential.id.clone(),
                    reason: "RANDOM_SPOT_CHECK",
                    probability: format!("{}.{:02}", decision.probability / 100, decision.probability % 100),
                },
                Some(jurisdiction.clone()),
            )
            .await?;
        let body = SpotCheckBody {
            verified: false,
            reason: "ROULETTE_TRIGGER",
            message: SPOT_CHECK_MESSAGE,
            audit_ref: format!("AUDIT-{}", Utc::now().timestamp_millis()),
        };
        return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
    }

    let solvency_proof_valid = credential
        .credential_subject
        .get("zkSolvency")
        .map(|bundle| state.zk.verify_solvency_proof(bundle));

    let body = VerifiedBody {
        verified: true,
        status: verified.status,
        issuer: &verified.issuer,
        trust_score: verified.trust_score,
        solvency_proof_valid,
    };
    Ok(Json(body).into_response())
}

/// POST /v1/passport/revoke
///
/// The `REVOCATION` ledger event is written only after the store has
/// acknowledged, and only for the first revocation of an id.
async fn revoke_passport(
    State(state): State<AppState>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<RevocationStatus>, AppError> {
    let req = extract_json(body)?;
    let credential_id = req.credential_id.trim();
    if credential_id.is_empty() {
        return Err(AppError::Validation("credential_id must be non-empty".into()));
    }

    let outcome = state.revocations.revoke(credential_id, req.reason.as_deref()).await?;
    if outcome.newly_revoked {
        Arc::clone(&state.ledger)
            .append_async(
                EventType::Revocation,
                RevocationEvent {
                    credential_id: outcome.credential_id.clone(),
                    reason: outcome.reason.clone(),
                },
                None,
            )
            .await?;
    }

    Ok(Json(RevocationStatus {
        credential_id: outcome.credential_id,
        revoked: true,
        reason: Some(outcome.reason),
        newly_revoked: Some(outcome.newly_revoked),
    }))
}

/// GET /v1/passport/revocations/{id}
async fn revocation_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RevocationStatus>, AppError> {
    let reason = state.revocations.reason(&id).await?;
    Ok(Json(RevocationStatus {
        credential_id: id,
        revoked: reason.is_some(),
        reason,
        newly_revoked: None,
    }))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
