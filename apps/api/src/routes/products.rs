//! Catalog endpoints. Reads are open to any user, writes need an admin.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use ventas_core::{NewProduct, Product, ProductUpdate};
use ventas_db::ProductFilter;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::services::{StockAdjustment, StockLevel};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/low-stock", get(low_stock))
        .route("/products/{id}", get(get_one).put(update).delete(remove))
        .route("/products/{id}/stock", patch(adjust_stock))
}

/// GET /api/products
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.products.list(filter).await?))
}

/// POST /api/products
pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(input): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.products.create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products/low-stock
pub async fn low_stock(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.products.low_stock(query.threshold).await?))
}

/// GET /api/products/{id}
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.products.get(id).await?))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.products.update(id, &changes).await?))
}

/// DELETE /api/products/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/products/{id}/stock
pub async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(adjustment): ApiJson<StockAdjustment>,
) -> ApiResult<Json<StockLevel>> {
    Ok(Json(state.products.adjust_stock(id, &adjustment).await?))
}
