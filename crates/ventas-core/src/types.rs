//! # Domain Types
//!
//! Core domain types used throughout Ventas.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄─┐│  id             │──►│  id             │       │
//! │  │  code (unique)  │  ││  customer_id    │   │  document       │       │
//! │  │  price_cents    │  ││  user_id        │   │  email (unique) │       │
//! │  │  stock (>= 0)   │  ││  state          │   └─────────────────┘       │
//! │  └─────────────────┘  ││  total_cents    │                             │
//! │                       │└───────┬─────────┘   ┌─────────────────┐       │
//! │                       │        │ owns 1..n   │      User       │       │
//! │                       │┌───────▼─────────┐   │  ─────────────  │       │
//! │                       └│ OrderLineItem   │   │  email (unique) │       │
//! │                        │  quantity       │   │  role           │       │
//! │                        │  unit_price     │   │  password_hash  │       │
//! │                        │  subtotal       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Enum values travel as lowercase Spanish tags (`pendiente`, `vendedor`,
//! `cedula`), the same strings stored in the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Business identifier, unique across the catalog.
    pub code: String,

    pub name: String,

    pub description: Option<String>,

    /// Price in cents. Always > 0.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Partial update of a product. `None` keeps the stored value.
///
/// Stock is not updatable here; it only moves through the stock
/// primitives and the order workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Customer
// =============================================================================

/// Kind of identity document a customer registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// National identity card.
    Cedula,
    Pasaporte,
    /// Tax identification number (companies).
    Nit,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Cedula,
        DocumentType::Pasaporte,
        DocumentType::Nit,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cedula => "cedula",
            DocumentType::Pasaporte => "pasaporte",
            DocumentType::Nit => "nit",
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Cedula
    }
}

/// A customer that places orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    /// Identity document number, unique.
    pub document: String,
    pub document_type: DocumentType,
    pub name: String,
    /// Contact email, unique.
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub document: String,
    #[serde(default)]
    pub document_type: DocumentType,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update of a customer. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerUpdate {
    pub document: Option<String>,
    pub document_type: Option<DocumentType>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// User
// =============================================================================

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management and catalog changes.
    Admin,
    /// Salesperson: customers and orders.
    Vendedor,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendedor => "vendedor",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order State
// =============================================================================

/// Lifecycle state of an order.
///
/// ```text
///   pendiente ──► confirmado ──► enviado ──► entregado
///       │             │
///       └─────────────┴──► cancelado
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum OrderState {
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "confirmado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "confirmado"))]
    Confirmed,
    #[serde(rename = "enviado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "enviado"))]
    Shipped,
    #[serde(rename = "entregado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "entregado"))]
    Delivered,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Cancelled,
}

impl OrderState {
    pub const ALL: [OrderState; 5] = [
        OrderState::Pending,
        OrderState::Confirmed,
        OrderState::Shipped,
        OrderState::Delivered,
        OrderState::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "pendiente",
            OrderState::Confirmed => "confirmado",
            OrderState::Shipped => "enviado",
            OrderState::Delivered => "entregado",
            OrderState::Cancelled => "cancelado",
        }
    }

    /// No transition leaves a terminal state.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }
}

impl Default for OrderState {
    fn default() -> Self {
        OrderState::Pending
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the wire tag; the English names are accepted too so query
/// strings like `?state=shipped` work.
impl FromStr for OrderState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendiente" | "pending" => Ok(OrderState::Pending),
            "confirmado" | "confirmed" => Ok(OrderState::Confirmed),
            "enviado" | "shipped" => Ok(OrderState::Shipped),
            "entregado" | "delivered" => Ok(OrderState::Delivered),
            "cancelado" | "cancelled" => Ok(OrderState::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "state".to_string(),
                allowed: OrderState::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order placed by a customer, registered by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    /// User that created the order.
    pub user_id: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    /// Sum of line subtotals, in cents.
    pub total_cents: i64,
    pub state: OrderState,
    /// Free text; stored encrypted, holds plaintext once loaded by services.
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Line Item
// =============================================================================

/// A line of an order.
/// Uses snapshot pattern: the unit price is frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit_price_cents.
    pub subtotal_cents: i64,
}

impl OrderLineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLineItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_state_wire_tags() {
        let json = serde_json::to_string(&OrderState::Delivered).unwrap();
        assert_eq!(json, "\"entregado\"");

        let state: OrderState = serde_json::from_str("\"cancelado\"").unwrap();
        assert_eq!(state, OrderState::Cancelled);
    }

    #[test]
    fn test_order_state_from_str_accepts_both_languages() {
        assert_eq!("enviado".parse::<OrderState>().unwrap(), OrderState::Shipped);
        assert_eq!("Shipped".parse::<OrderState>().unwrap(), OrderState::Shipped);
        assert!("lost".parse::<OrderState>().is_err());
    }

    #[test]
    fn test_order_state_default_and_terminal() {
        assert_eq!(OrderState::default(), OrderState::Pending);
        assert!(OrderState::Delivered.is_terminal());
        assert!(OrderState::Cancelled.is_terminal());
        assert!(!OrderState::Shipped.is_terminal());
    }

    #[test]
    fn test_role_wire_tags() {
        assert_eq!(serde_json::to_string(&Role::Vendedor).unwrap(), "\"vendedor\"");
        assert!(Role::Admin.is_admin());
        assert!(!Role::Vendedor.is_admin());
    }

    #[test]
    fn test_document_type_default() {
        assert_eq!(DocumentType::default(), DocumentType::Cedula);
        let json = serde_json::to_string(&DocumentType::Nit).unwrap();
        assert_eq!(json, "\"nit\"");
    }

    #[test]
    fn test_user_never_serializes_password_hash() {
        let now = Utc::now();
        let user = User {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password_hash"));
    }
}
