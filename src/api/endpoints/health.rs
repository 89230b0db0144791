//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store_ok: bool,
}

/// `GET /api/health` — liveness plus a store touch.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    let store_ok = ctx.state.open_store().is_ok();
    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
        store_ok,
    })
}
