//! # ventas-db: Database Layer for Ventas
//!
//! This crate provides database access for the Ventas backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ventas Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler → service (apps/api)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     ventas-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo  │    │ 0001_initial │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │               │    │ OrderRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DATABASE_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ventas_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("ventas.db")).await?;
//! let low = db.products().low_stock(10).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::{CustomerFilter, CustomerRepository};
pub use repository::order::{NewOrder, OrderFilter, OrderRepository};
pub use repository::product::{ProductFilter, ProductRepository};
pub use repository::user::{UserChanges, UserRepository};
