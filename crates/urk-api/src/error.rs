//! # API Error Types
//!
//! [`AppError`] implements `IntoResponse` with a uniform JSON body:
//!
//! ```json
//! {"error": {"code": "VALIDATION_ERROR", "message": "...", "details": {...}}}
//! ```
//!
//! Internal error messages are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use urk_ledger::LedgerError;
use urk_policy::{RegistryError, RevocationError};
use urk_vc::{IssuanceError, VerifyError};
use urk_zkp::ZkError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Well-formed request that fails shape rules (422).
    #[error("validation error: {0}")]
    Validation(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Net worth below the requested tier threshold (422).
    #[error("{0}")]
    SolvencyCheckFailed(String),

    /// A dependency the request needs is unreachable (503).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Logged, never returned to the client (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::SolvencyCheckFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "SOLVENCY_CHECK_FAILED"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Unavailable(_) => tracing::error!(error = %self, "dependency unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<urk_core::ValidationError> for AppError {
    fn from(err: urk_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider(_) => Self::BadRequest(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<RevocationError> for AppError {
    fn from(err: RevocationError) -> Self {
        match err {
            RevocationError::EmptyId => Self::Validation(err.to_string()),
            RevocationError::Http { .. } | RevocationError::Api { .. } => Self::Unavailable(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::UnknownIssuer(_) => Self::NotFound(err.to_string()),
            IssuanceError::Solvency(ZkError::SolvencyCheckFailed { .. }) => Self::SolvencyCheckFailed(err.to_string()),
            IssuanceError::Solvency(ZkError::InvalidWitness(_) | ZkError::MissingNullifierInputs) => {
                Self::Validation(err.to_string())
            }
            IssuanceError::Credential(_) => Self::Validation(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Revocation(e) => e.into(),
            VerifyError::Ledger(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_is_422() {
        let (status, body) = body_json(AppError::Validation("legalName too short".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn internal_message_hidden() {
        let (status, body) = body_json(AppError::Internal("disk on fire at /var/lib".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn solvency_failure_code() {
        let err: AppError = IssuanceError::Solvency(ZkError::SolvencyCheckFailed {
            tier: "TIER_1M".into(),
            threshold: 1_000_000,
        })
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "SOLVENCY_CHECK_FAILED");
    }

    #[tokio::test]
    async fn issuance_error_mapping() {
        let unknown: AppError = IssuanceError::UnknownIssuer("did:web:ghost.sg".into()).into();
        assert!(matches!(unknown, AppError::NotFound(_)));
        let witness: AppError = IssuanceError::Solvency(ZkError::InvalidWitness("assets")).into();
        assert!(matches!(witness, AppError::Validation(_)));
        let nullifier: AppError = IssuanceError::Solvency(ZkError::MissingNullifierInputs).into();
        assert!(matches!(nullifier, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unreachable_revocation_store_is_503() {
        let err: AppError = RevocationError::Api {
            endpoint: "https://kv.example.com/v1/kv/revoked:x".into(),
            status: 502,
            body: String::new(),
        }
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }
}
