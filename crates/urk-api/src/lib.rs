//! # urk-api — Universal Reliance Kernel Node
//!
//! Thin HTTP surface over the credential lifecycle engine. Handlers
//! authenticate, check request shape, forward typed input to
//! [`urk_vc::CredentialIssuer`] / [`urk_vc::CredentialVerifier`], and map
//! outcomes to status codes. Lifecycle rules live in the engine crates.
//!
//! ## API Surface
//!
//! | Route                               | Module                   |
//! |-------------------------------------|--------------------------|
//! | `POST /v1/passport/issue`           | [`routes::passport`]     |
//! | `POST /v1/passport/verify`          | [`routes::passport`]     |
//! | `POST /v1/passport/revoke`          | [`routes::passport`]     |
//! | `GET /v1/passport/revocations/{id}` | [`routes::passport`]     |
//! | `GET /v1/providers`                 | [`routes::providers`]    |
//! | `GET /v1/ledger/verify`             | [`routes::ledger`]       |
//! | `GET /health`, `/health/*`          | unauthenticated          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the router. Health probes sit outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::passport::router())
        .merge(routes::providers::router())
        .merge(routes::ledger::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ACTIVE", "role": "ISSUER_NODE" }))
}

async fn liveness() -> &'static str {
    "ok"
}

/// 503 while the ledger chain fails verification.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let ledger = state.ledger.clone();
    let intact = tokio::task::spawn_blocking(move || ledger.verify_chain().is_none())
        .await
        .unwrap_or(false);
    if intact {
        (StatusCode::OK, "ready")
    } else {
        tracing::error!("readiness failed: ledger chain does not verify");
        (StatusCode::SERVICE_UNAVAILABLE, "ledger chain invalid")
    }
}
