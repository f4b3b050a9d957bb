//! Read-only statistics.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use ventas_core::OrderStatistics;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::Dashboard;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/statistics/orders", get(orders))
        .route("/statistics/dashboard", get(dashboard))
}

/// GET /api/statistics/orders
pub async fn orders(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> ApiResult<Json<OrderStatistics>> {
    Ok(Json(state.stats.order_statistics().await?))
}

/// GET /api/statistics/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.stats.dashboard().await?))
}
