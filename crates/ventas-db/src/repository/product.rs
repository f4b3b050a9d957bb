//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with soft delete
//! - Batch lookup of active products for order creation
//! - Stock primitives (reduce / increase) as conditional single-row updates
//! - Increases are capped at `MAX_STOCK` in the same conditional update
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reduce(id, 3, Exact)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock - 3                                  │
//! │  WHERE id = ? AND stock >= 3          ← check and write in one step     │
//! │  RETURNING stock                                                        │
//! │       │                                                                 │
//! │       ├── row returned  → new stock                                     │
//! │       └── no row        → NotFound or InsufficientStock                 │
//! │                                                                         │
//! │  Two concurrent reductions can never both pass the check.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use ventas_core::{
    CoreError, NewProduct, Product, ProductUpdate, StockReduction, ValidationError, MAX_STOCK,
};

/// Filters for listing products.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Include soft-deleted products.
    pub include_inactive: bool,
    pub category: Option<String>,
    /// Substring match on name or code.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            include_inactive: false,
            category: None,
            search: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id(7).await?;
/// let left = repo.reduce_stock(7, 2, StockReduction::Exact).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns the stored row.
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        debug!(code = %input.code, "Inserting product");

        let now = Utc::now();
        let product: Product = sqlx::query_as(
            r#"
            INSERT INTO products (
                code, name, description, price_cents, stock, category,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING *
            "#,
        )
        .bind(input.code.trim())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(&input.category)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(input.code.trim()))?;

        Ok(product)
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as("SELECT * FROM products WHERE code = ?1")
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products matching the filter, ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as(
            r#"
            SELECT * FROM products
            WHERE (?1 OR is_active = 1)
              AND (?2 IS NULL OR category = ?2)
              AND (?3 IS NULL OR name LIKE '%' || ?3 || '%' OR code LIKE '%' || ?3 || '%')
            ORDER BY name, id
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(filter.include_inactive)
        .bind(&filter.category)
        .bind(&filter.search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial update and returns the stored row.
    pub async fn update(&self, id: i64, changes: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let product: Option<Product> = sqlx::query_as(
            r#"
            UPDATE products SET
                code        = COALESCE(?2, code),
                name        = COALESCE(?3, name),
                description = COALESCE(?4, description),
                price_cents = COALESCE(?5, price_cents),
                category    = COALESCE(?6, category),
                is_active   = COALESCE(?7, is_active),
                updated_at  = ?8
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.code.as_deref().map(str::trim))
        .bind(changes.name.as_deref().map(str::trim))
        .bind(&changes.description)
        .bind(changes.price_cents)
        .bind(&changes.category)
        .bind(changes.is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(changes.code.as_deref().unwrap_or("")))?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical order lines keep pointing at the row.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Resolves the active products among `ids` in one query.
    ///
    /// Unknown and inactive ids are simply absent from the result.
    pub async fn find_active_by_ids(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_active_by_ids_in(&mut conn, ids).await
    }

    /// Removes `qty` units from stock and returns the new stock.
    pub async fn reduce_stock(&self, id: i64, qty: i64, mode: StockReduction) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        reduce_stock_in(&mut conn, id, qty, mode).await
    }

    /// Adds `qty` units to stock and returns the new stock.
    pub async fn increase_stock(&self, id: i64, qty: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        increase_stock_in(&mut conn, id, qty).await
    }

    /// Active products at or below `threshold` units, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as(
            "SELECT * FROM products WHERE is_active = 1 AND stock <= ?1 ORDER BY stock, id",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products at or below `threshold` units.
    pub async fn count_low_stock(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1 AND stock <= ?1")
                .bind(threshold)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-scoped operations
// =============================================================================
// These run on whatever connection they are given, so the order workflow can
// call them on its open transaction.

pub(crate) async fn find_active_by_ids_in(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let ids_json = serde_json::to_string(ids).map_err(|e| DbError::Internal(e.to_string()))?;
    let products = sqlx::query_as(
        r#"
        SELECT * FROM products
        WHERE is_active = 1
          AND id IN (SELECT value FROM json_each(?1))
        "#,
    )
    .bind(ids_json)
    .fetch_all(&mut *conn)
    .await?;

    Ok(products)
}

pub(crate) async fn reduce_stock_in(
    conn: &mut SqliteConnection,
    id: i64,
    qty: i64,
    mode: StockReduction,
) -> DbResult<i64> {
    debug!(id = %id, qty = %qty, mode = ?mode, "Reducing stock");

    let sql = match mode {
        StockReduction::Exact => {
            "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock >= ?2 RETURNING stock"
        }
        StockReduction::ClampAtZero => {
            "UPDATE products SET stock = MAX(0, stock - ?2), updated_at = ?3 \
             WHERE id = ?1 RETURNING stock"
        }
    };

    let new_stock: Option<i64> = sqlx::query_scalar(sql)
        .bind(id)
        .bind(qty)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(stock) = new_stock {
        return Ok(stock);
    }

    let current: Option<(String, i64)> = sqlx::query_as("SELECT code, stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match current {
        None => Err(DbError::not_found("Product", id)),
        Some((code, available)) => Err(CoreError::InsufficientStock {
            product_id: id,
            code,
            available,
            required: qty,
        }
        .into()),
    }
}

pub(crate) async fn increase_stock_in(
    conn: &mut SqliteConnection,
    id: i64,
    qty: i64,
) -> DbResult<i64> {
    debug!(id = %id, qty = %qty, "Increasing stock");

    let new_stock: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock = stock + ?2, updated_at = ?3 \
         WHERE id = ?1 AND stock <= ?4 - ?2 RETURNING stock",
    )
    .bind(id)
    .bind(qty)
    .bind(Utc::now())
    .bind(MAX_STOCK)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(stock) = new_stock {
        return Ok(stock);
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        None => Err(DbError::not_found("Product", id)),
        Some(_) => Err(CoreError::from(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        })
        .into()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{new_product, test_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(&new_product("LAP-001", 250_000, 5)).await.unwrap();
        assert!(product.id > 0);
        assert!(product.is_active);
        assert_eq!(product.stock, 5);

        let loaded = repo.get_by_code("LAP-001").await.unwrap().unwrap();
        assert_eq!(loaded, product);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&new_product("LAP-001", 100, 1)).await.unwrap();
        let err = repo.insert(&new_product("LAP-001", 200, 1)).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "products.code");
                assert_eq!(value, "LAP-001");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&new_product("MOU-001", 8999, 10)).await.unwrap();

        let updated = repo
            .update(
                product.id,
                &ProductUpdate {
                    name: Some("Wireless Mouse".to_string()),
                    price_cents: Some(7999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Wireless Mouse");
        assert_eq!(updated.price_cents, 7999);
        assert_eq!(updated.code, "MOU-001");

        repo.soft_delete(product.id).await.unwrap();
        let listed = repo.list(&ProductFilter::default()).await.unwrap();
        assert!(listed.is_empty());

        let all = repo
            .list(&ProductFilter {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        assert!(matches!(
            repo.soft_delete(4242).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let repo = db.products();

        let mut laptop = new_product("LAP-001", 250_000, 5);
        laptop.name = "Laptop Pro".to_string();
        laptop.category = Some("computo".to_string());
        repo.insert(&laptop).await.unwrap();

        let mut mouse = new_product("MOU-001", 8999, 5);
        mouse.name = "Mouse".to_string();
        mouse.category = Some("accesorios".to_string());
        repo.insert(&mouse).await.unwrap();

        let by_category = repo
            .list(&ProductFilter {
                category: Some("computo".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].code, "LAP-001");

        let by_search = repo
            .list(&ProductFilter {
                search: Some("mou".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_search.len(), 1);

        let paged = repo
            .list(&ProductFilter {
                limit: 1,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
    }

    #[tokio::test]
    async fn test_find_active_by_ids_skips_inactive_and_unknown() {
        let db = test_db().await;
        let repo = db.products();
        let a = repo.insert(&new_product("A-1", 100, 1)).await.unwrap();
        let b = repo.insert(&new_product("B-1", 100, 1)).await.unwrap();
        repo.soft_delete(b.id).await.unwrap();

        let found = repo.find_active_by_ids(&[a.id, b.id, 777]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);

        assert!(repo.find_active_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reduce_stock_exact() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&new_product("KEY-001", 12000, 5)).await.unwrap();

        assert_eq!(
            repo.reduce_stock(product.id, 3, StockReduction::Exact).await.unwrap(),
            2
        );

        let err = repo
            .reduce_stock(product.id, 3, StockReduction::Exact)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock {
                available: 2,
                required: 3,
                ..
            })
        ));

        let stored = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 2);
    }

    #[tokio::test]
    async fn test_reduce_stock_clamps_at_zero() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&new_product("KEY-002", 12000, 2)).await.unwrap();

        assert_eq!(
            repo.reduce_stock(product.id, 5, StockReduction::ClampAtZero)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_increase_stock_and_unknown_product() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&new_product("KEY-003", 12000, 0)).await.unwrap();

        assert_eq!(repo.increase_stock(product.id, 1_000).await.unwrap(), 1_000);
        assert!(matches!(
            repo.increase_stock(31337, 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.reduce_stock(31337, 1, StockReduction::Exact).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_increase_stock_beyond_limit_is_rejected() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&new_product("KEY-004", 12000, 7)).await.unwrap();

        for qty in [i64::MAX, MAX_STOCK] {
            let result = repo.increase_stock(product.id, qty).await;
            assert!(matches!(
                result,
                Err(DbError::Rule(CoreError::Validation(ValidationError::OutOfRange { .. })))
            ));
        }

        let after = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 7);
        assert_eq!(
            repo.increase_stock(product.id, MAX_STOCK - 7).await.unwrap(),
            MAX_STOCK
        );
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&new_product("LOW-1", 100, 2)).await.unwrap();
        repo.insert(&new_product("LOW-2", 100, 10)).await.unwrap();
        repo.insert(&new_product("OK-1", 100, 11)).await.unwrap();

        let low = repo.low_stock(10).await.unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].code, "LOW-1");
        assert_eq!(repo.count_low_stock(10).await.unwrap(), 2);
        assert_eq!(repo.count_active().await.unwrap(), 3);
    }
}
