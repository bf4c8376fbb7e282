//! # Bearer Token Middleware
//!
//! Every `/v1/*` route requires `Authorization: Bearer <API_AUTH_TOKEN>`.
//!
//! | Request                          | Response          |
//! |----------------------------------|-------------------|
//! | no header, or not `Bearer ...`   | 401 `UNAUTHORIZED`|
//! | `Bearer` with the wrong token    | 403 `FORBIDDEN`   |
//!
//! Tokens are compared in constant time.

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Injected into request extensions by [`crate::app`].
#[derive(Clone)]
pub struct AuthConfig {
    pub token: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("token", &"[REDACTED]").finish()
    }
}

/// When lengths differ a dummy comparison still runs, so timing does not
/// reveal the expected length.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(config) = request.extensions().get::<AuthConfig>().cloned() else {
        tracing::error!("auth middleware mounted without AuthConfig");
        return AppError::Internal("authentication is not configured".into()).into_response();
    };

    let verdict = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| constant_time_token_eq(token.trim(), &config.token));

    match verdict {
        Some(true) => next.run(request).await,
        None => {
            tracing::warn!(path = %request.uri().path(), "missing bearer token");
            AppError::Unauthorized("Missing Authorization Header".into()).into_response()
        }
        Some(false) => {
            tracing::warn!(path = %request.uri().path(), "invalid bearer token");
            AppError::Forbidden("Invalid API Token".into()).into_response()
        }
    }
}
