/// Health check endpoint
use axum::{extract::State, Json};
use serde::Serialize;

use taskhub_shared::db::pool;

use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// GET /health — liveness plus database connectivity
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    pool::health_check(&state.db).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: taskhub_shared::VERSION,
        database: "up",
    }))
}
