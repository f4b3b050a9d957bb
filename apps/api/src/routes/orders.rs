//! Order workflow endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use ventas_core::{Order, OrderDetail, OrderState};
use ventas_db::OrderFilter;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::services::CreateOrderRequest;
use crate::AppState;

/// Body of `PATCH /api/orders/{id}/state`.
#[derive(Debug, Deserialize)]
pub struct StateChange {
    pub state: OrderState,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list).post(create))
        .route("/orders/{id}", get(get_one).delete(remove))
        .route("/orders/{id}/state", patch(change_state))
        .route("/orders/{id}/cancel", post(cancel))
}

/// GET /api/orders
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list(&filter).await?))
}

/// POST /api/orders: registers the order on behalf of the caller.
pub async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let detail = state.orders.create(&user, &req).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/orders/{id}
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<OrderDetail>> {
    Ok(Json(state.orders.get(id).await?))
}

/// PATCH /api/orders/{id}/state
pub async fn change_state(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<StateChange>,
) -> ApiResult<Json<OrderDetail>> {
    Ok(Json(state.orders.transition(id, change.state).await?))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<OrderDetail>> {
    Ok(Json(state.orders.cancel(id).await?))
}

/// DELETE /api/orders/{id}: removes the row, stock stays as is.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.orders.delete(id).await?;
    tracing::info!(order_id = %id, by = %admin.id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}
