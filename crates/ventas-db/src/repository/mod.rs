//! # Repository Module
//!
//! Database repository implementations for Ventas.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service (apps/api)                                                    │
//! │       │                                                                 │
//! │       │  db.orders().create(&new_order)                                │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── create(&self, input)          one transaction                     │
//! │  ├── transition(&self, id, to)     conditional update                  │
//! │  └── cancel(&self, id, policy)     one transaction                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock primitives
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers
//! - [`UserRepository`](user::UserRepository) - User accounts
//! - [`OrderRepository`](order::OrderRepository) - Orders, line items, workflow

pub mod customer;
pub mod order;
pub mod product;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};
    use ventas_core::{DocumentType, NewCustomer, NewProduct};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn new_product(code: &str, price_cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            code: code.to_string(),
            name: format!("Product {code}"),
            description: None,
            price_cents,
            stock,
            category: None,
        }
    }

    pub fn new_customer(document: &str, email: &str) -> NewCustomer {
        NewCustomer {
            document: document.to_string(),
            document_type: DocumentType::Cedula,
            name: format!("Customer {document}"),
            email: email.to_string(),
            phone: None,
            address: None,
        }
    }
}
