//! `GET /v1/providers`: every issuer the node knows about, with its tier
//! and home jurisdiction.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use urk_policy::ProviderRecord;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderRecord>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/providers", get(list_providers))
}

async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.providers.providers(),
    })
}
