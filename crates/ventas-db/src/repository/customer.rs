//! # Customer Repository
//!
//! Database operations for customers. Deletion is soft so historical orders
//! keep their customer reference.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use ventas_core::{Customer, CustomerUpdate, NewCustomer};

/// Filters for listing customers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CustomerFilter {
    pub include_inactive: bool,
    /// Substring match on name, document or email.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for CustomerFilter {
    fn default() -> Self {
        CustomerFilter {
            include_inactive: false,
            search: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer and returns the stored row.
    pub async fn insert(&self, input: &NewCustomer) -> DbResult<Customer> {
        debug!(document = %input.document, "Inserting customer");

        let now = Utc::now();
        let customer: Customer = sqlx::query_as(
            r#"
            INSERT INTO customers (
                document, document_type, name, email, phone, address,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING *
            "#,
        )
        .bind(input.document.trim())
        .bind(input.document_type)
        .bind(input.name.trim())
        .bind(input.email.trim())
        .bind(&input.phone)
        .bind(&input.address)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_value(e, &input.document, &input.email))?;

        Ok(customer)
    }

    /// Gets a customer by ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists customers matching the filter, ordered by name.
    pub async fn list(&self, filter: &CustomerFilter) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as(
            r#"
            SELECT * FROM customers
            WHERE (?1 OR is_active = 1)
              AND (?2 IS NULL
                   OR name LIKE '%' || ?2 || '%'
                   OR document LIKE '%' || ?2 || '%'
                   OR email LIKE '%' || ?2 || '%')
            ORDER BY name, id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(filter.include_inactive)
        .bind(&filter.search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Applies a partial update and returns the stored row.
    pub async fn update(&self, id: i64, changes: &CustomerUpdate) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let customer: Option<Customer> = sqlx::query_as(
            r#"
            UPDATE customers SET
                document      = COALESCE(?2, document),
                document_type = COALESCE(?3, document_type),
                name          = COALESCE(?4, name),
                email         = COALESCE(?5, email),
                phone         = COALESCE(?6, phone),
                address       = COALESCE(?7, address),
                is_active     = COALESCE(?8, is_active),
                updated_at    = ?9
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.document.as_deref().map(str::trim))
        .bind(changes.document_type)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.email.as_deref().map(str::trim))
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(changes.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            unique_value(
                e,
                changes.document.as_deref().unwrap_or(""),
                changes.email.as_deref().unwrap_or(""),
            )
        })?;

        customer.ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Soft-deletes a customer by setting is_active = false.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting customer");

        let result = sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Counts active customers.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Attaches the value matching whichever unique column failed.
fn unique_value(err: sqlx::Error, document: &str, email: &str) -> DbError {
    let err = DbError::from(err);
    let value = match &err {
        DbError::UniqueViolation { field, .. } if field.ends_with("email") => email,
        _ => document,
    };
    err.with_value(value.trim())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{new_customer, test_db};
    use ventas_core::DocumentType;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.customers();

        let customer = repo
            .insert(&new_customer("1020304050", "carlos@example.com"))
            .await
            .unwrap();
        assert!(customer.is_active);
        assert_eq!(customer.document_type, DocumentType::Cedula);

        let loaded = repo.get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.email, "carlos@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_document_and_email() {
        let db = test_db().await;
        let repo = db.customers();
        repo.insert(&new_customer("1020304050", "a@example.com"))
            .await
            .unwrap();

        let err = repo
            .insert(&new_customer("1020304050", "b@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref value, .. } if value == "1020304050"
        ));

        let err = repo
            .insert(&new_customer("9999999", "A@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, .. } if field == "customers.email"
        ));
    }

    #[tokio::test]
    async fn test_update_soft_delete_and_count() {
        let db = test_db().await;
        let repo = db.customers();
        let customer = repo
            .insert(&new_customer("NIT90011", "empresa@example.com"))
            .await
            .unwrap();

        let updated = repo
            .update(
                customer.id,
                &CustomerUpdate {
                    document_type: Some(DocumentType::Nit),
                    phone: Some("3001234567".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.document_type, DocumentType::Nit);
        assert_eq!(updated.phone.as_deref(), Some("3001234567"));

        assert_eq!(repo.count_active().await.unwrap(), 1);
        repo.soft_delete(customer.id).await.unwrap();
        assert_eq!(repo.count_active().await.unwrap(), 0);
        assert!(repo.list(&CustomerFilter::default()).await.unwrap().is_empty());

        assert!(matches!(
            repo.update(555, &CustomerUpdate::default()).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
