//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

/// GET /health: 200 when the database answers, 503 otherwise.
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
