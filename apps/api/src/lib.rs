//! # Ventas API
//!
//! HTTP server for the sales and inventory backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Ventas API                                     │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐ │
//! │  │ /api/auth    │  │ /api/products│  │ /api/orders  │  │/api/stats..│ │
//! │  │ /api/users   │  │ /api/custom..│  │              │  │            │ │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └─────┬──────┘ │
//! │         └─────────────────┴──────┬──────────┴────────────────┘        │
//! │                                  ▼                                      │
//! │            AuthUser / AdminUser extractors (JWT, active account)        │
//! │                                  ▼                                      │
//! │                 Services (validation, encryption, policy)              │
//! │                                  ▼                                      │
//! │              ventas-db repositories ──► SQLite (WAL, FK on)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the environment variables read at start-up.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use ventas_db::Database;

pub use config::ApiConfig;
pub use error::{ApiError, ServiceError};

use crate::auth::JwtManager;
use crate::crypto::FieldCipher;
use crate::services::{
    AuthService, CustomerService, OrderService, ProductService, StatsService, UserService,
};

/// Shared application state.
///
/// One repository per entity is built from the pool here and handed to the
/// services that need it.
pub struct AppState {
    pub config: ApiConfig,
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub auth: AuthService,
    pub users: UserService,
    pub products: ProductService,
    pub customers: CustomerService,
    pub orders: OrderService,
    pub stats: StatsService,
}

impl AppState {
    pub fn new(config: ApiConfig, db: Database) -> Result<Self, ServiceError> {
        let jwt = Arc::new(JwtManager::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        ));
        let cipher = Arc::new(FieldCipher::from_secret(&config.field_encryption_key)?);

        let orders = OrderService::new(db.orders(), cipher, config.cancellation_policy);

        Ok(AppState {
            auth: AuthService::new(db.users(), jwt.clone()),
            users: UserService::new(db.users()),
            products: ProductService::new(db.products(), config.low_stock_threshold),
            customers: CustomerService::new(db.customers(), orders.clone()),
            stats: StatsService::new(
                db.orders(),
                db.products(),
                db.customers(),
                db.users(),
                config.low_stock_threshold,
            ),
            orders,
            jwt,
            db,
            config,
        })
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::products::router())
        .merge(routes::customers::router())
        .merge(routes::users::router())
        .merge(routes::orders::router())
        .merge(routes::statistics::router());

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api", api)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
