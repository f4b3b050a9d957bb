//! HTTP route handlers.
//!
//! Handlers stay thin: extract, call a service, wrap the result in JSON.
//! Request bodies, query strings and path segments go through the
//! extractors below so that malformed input gets the same error body as
//! everything else.

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use crate::error::ApiError;

pub mod auth;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;
pub mod statistics;
pub mod users;

/// JSON body; rejections become [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string; rejections become [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters; rejections become [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `?limit=&offset=` for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}
