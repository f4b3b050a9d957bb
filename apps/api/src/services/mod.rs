//! # Services
//!
//! Business operations behind the HTTP routes. Each service owns the
//! repositories it needs, handed over at start-up.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AuthService      login · refresh · authenticate                       │
//! │  UserService      admin user management                                │
//! │  ProductService   catalog · stock adjustment · low stock               │
//! │  CustomerService  customers · their orders                             │
//! │  OrderService     create · transition · cancel · delete                │
//! │  StatsService     order statistics · dashboard                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth_service;
pub mod customer_service;
pub mod order_service;
pub mod product_service;
pub mod stats_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginResponse};
pub use customer_service::CustomerService;
pub use order_service::{CreateOrderRequest, OrderService};
pub use product_service::{ProductService, StockAdjustment, StockLevel, StockOperation};
pub use stats_service::{Dashboard, StatsService};
pub use user_service::{CreateUserRequest, UpdateUserRequest, UserService};
