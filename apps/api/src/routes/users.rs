//! User management. Every route here needs an admin.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use ventas_core::User;

use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::services::{CreateUserRequest, UpdateUserRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", get(get_one).put(update).delete(remove))
}

/// GET /api/users
pub async fn list(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .users
        .list(query.include_inactive, query.limit, query.offset)
        .await?;
    Ok(Json(users))
}

/// POST /api/users
pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiJson(input): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create(&input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/{id}
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.update(&admin, id, &input).await?))
}

/// DELETE /api/users/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.users.deactivate(&admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
