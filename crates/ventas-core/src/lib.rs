//! # ventas-core: Pure Business Logic for Ventas
//!
//! This crate contains the domain rules of the sales/inventory backend
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ventas Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    routes ──► services (orders, catalog, auth, statistics)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ventas-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  types   │ │  money   │ │  order   │ │validation│ │stats │ │   │
//! │  │   │ Product  │ │  Money   │ │ pricing  │ │  rules   │ │      │ │   │
//! │  │   │ Order    │ │          │ │ workflow │ │          │ │      │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ventas-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Order, User, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`order`] - Order pricing and the order state machine
//! - [`stats`] - Order statistics aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use ventas_core::money::Money;
//! use ventas_core::order::{price_order, LineRequest, PricedProduct};
//!
//! let products = vec![
//!     PricedProduct { id: 1, code: "MOU-01".into(), price: Money::from_cents(8999), stock: 10 },
//!     PricedProduct { id: 2, code: "KEY-01".into(), price: Money::from_cents(12000), stock: 5 },
//! ];
//! let lines = vec![
//!     LineRequest { product_id: 1, quantity: 2 },
//!     LineRequest { product_id: 2, quantity: 1 },
//! ];
//!
//! let priced = price_order(&lines, &products).unwrap();
//! assert_eq!(priced.total.cents(), 29998);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{CancellationPolicy, StockReduction};
pub use stats::OrderStatistics;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct lines in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single product in one order line.
///
/// ## Business Reason
/// Catches typing mistakes (10000 instead of 10) before they hit stock.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Highest accepted unit price, in cents (1 000 000 000.00).
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_ORDER_LINES`] an order total stays
/// far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Highest stock a product can hold.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Minimum password length for user accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;
