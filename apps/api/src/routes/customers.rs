//! Customer endpoints, open to any authenticated user.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use ventas_core::{Customer, CustomerUpdate, NewCustomer, Order};
use ventas_db::CustomerFilter;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::{ApiJson, ApiPath, ApiQuery, Pagination};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/{id}", get(get_one).put(update).delete(remove))
        .route("/customers/{id}/orders", get(orders))
}

/// GET /api/customers
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.customers.list(filter).await?))
}

/// POST /api/customers
pub async fn create(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiJson(input): ApiJson<NewCustomer>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.customers.create(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers/{id}
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.customers.get(id).await?))
}

/// PUT /api/customers/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.customers.update(id, &changes).await?))
}

/// DELETE /api/customers/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/customers/{id}/orders
pub async fn orders(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.customers.orders(id, page.limit, page.offset).await?))
}
