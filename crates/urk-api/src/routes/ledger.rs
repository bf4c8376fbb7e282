//! `GET /v1/ledger/verify`: recompute the whole chain and report the first
//! violating block, if any.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use urk_ledger::ChainReport;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/ledger/verify", get(verify_ledger))
}

async fn verify_ledger(State(state): State<AppState>) -> Result<Json<ChainReport>, AppError> {
    let ledger = state.ledger.clone();
    let report = tokio::task::spawn_blocking(move || ledger.report())
        .await
        .map_err(|e| AppError::Internal(format!("ledger verification task failed: {e}")))?;
    if !report.valid {
        tracing::error!(first_violation = ?report.first_violation, "ledger chain verification failed");
    }
    Ok(Json(report))
}
