//! Catalog management and stock adjustment.

use serde::{Deserialize, Serialize};
use tracing::info;
use ventas_core::validation::{
    validate_new_product, validate_pagination, validate_product_update, validate_search_query,
    validate_stock_delta,
};
use ventas_core::{CoreError, NewProduct, Product, ProductUpdate, StockReduction};
use ventas_db::{ProductFilter, ProductRepository};

use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Increase,
    Reduce,
}

/// Body of `PATCH /api/products/{id}/stock`.
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub operation: StockOperation,
    pub quantity: i64,
    /// Only read for `reduce`.
    #[serde(default)]
    pub mode: StockReduction,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub product_id: i64,
    pub stock: i64,
}

#[derive(Clone)]
pub struct ProductService {
    products: ProductRepository,
    low_stock_threshold: i64,
}

impl ProductService {
    pub fn new(products: ProductRepository, low_stock_threshold: i64) -> Self {
        ProductService {
            products,
            low_stock_threshold,
        }
    }

    pub async fn create(&self, input: &NewProduct) -> ServiceResult<Product> {
        validate_new_product(input)?;
        let product = self.products.insert(input).await?;
        info!(product_id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Product> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id).into())
    }

    pub async fn list(&self, mut filter: ProductFilter) -> ServiceResult<Vec<Product>> {
        validate_pagination(filter.limit, filter.offset)?;
        filter.search = match filter.search.as_deref() {
            Some(query) => Some(validate_search_query(query)?).filter(|q| !q.is_empty()),
            None => None,
        };
        Ok(self.products.list(&filter).await?)
    }

    pub async fn update(&self, id: i64, changes: &ProductUpdate) -> ServiceResult<Product> {
        validate_product_update(changes)?;
        let product = self.products.update(id, changes).await?;
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Soft delete.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.products.soft_delete(id).await?;
        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// Moves stock outside the order workflow.
    pub async fn adjust_stock(&self, id: i64, adjustment: &StockAdjustment) -> ServiceResult<StockLevel> {
        validate_stock_delta(adjustment.quantity)?;

        let stock = match adjustment.operation {
            StockOperation::Increase => self.products.increase_stock(id, adjustment.quantity).await?,
            StockOperation::Reduce => {
                self.products
                    .reduce_stock(id, adjustment.quantity, adjustment.mode)
                    .await?
            }
        };

        info!(
            product_id = %id,
            operation = ?adjustment.operation,
            quantity = adjustment.quantity,
            stock,
            "Stock adjusted"
        );
        Ok(StockLevel { product_id: id, stock })
    }

    /// Active products at or below the configured threshold.
    pub async fn low_stock(&self, threshold: Option<i64>) -> ServiceResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold).max(0);
        Ok(self.products.low_stock(threshold).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use ventas_db::{Database, DbConfig, DbError};

    async fn setup() -> ProductService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ProductService::new(db.products(), 10)
    }

    fn product(code: &str, stock: i64) -> NewProduct {
        NewProduct {
            code: code.into(),
            name: format!("Producto {code}"),
            description: None,
            price_cents: 8_999,
            stock,
            category: Some("accesorios".into()),
        }
    }

    #[tokio::test]
    async fn test_create_validates() {
        let service = setup().await;

        let mut bad = product("MOU-01", 5);
        bad.price_cents = 0;
        assert!(matches!(
            service.create(&bad).await,
            Err(ServiceError::Core(CoreError::Validation(_)))
        ));

        service.create(&product("MOU-01", 5)).await.unwrap();
        assert!(matches!(
            service.create(&product("MOU-01", 5)).await,
            Err(ServiceError::Db(DbError::UniqueViolation { .. }))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let service = setup().await;
        let p = service.create(&product("MOU-01", 5)).await.unwrap();

        let up = StockAdjustment {
            operation: StockOperation::Increase,
            quantity: 10,
            mode: StockReduction::Exact,
        };
        assert_eq!(service.adjust_stock(p.id, &up).await.unwrap().stock, 15);

        let too_much = StockAdjustment {
            operation: StockOperation::Reduce,
            quantity: 20,
            mode: StockReduction::Exact,
        };
        assert!(matches!(
            service.adjust_stock(p.id, &too_much).await,
            Err(ServiceError::Db(DbError::Rule(CoreError::InsufficientStock { available: 15, .. })))
        ));

        let clamp = StockAdjustment {
            mode: StockReduction::ClampAtZero,
            ..too_much
        };
        assert_eq!(service.adjust_stock(p.id, &clamp).await.unwrap().stock, 0);

        let zero = StockAdjustment { quantity: 0, ..up };
        assert!(service.adjust_stock(p.id, &zero).await.is_err());
    }

    #[tokio::test]
    async fn test_low_stock_uses_threshold() {
        let service = setup().await;
        service.create(&product("A-1", 3)).await.unwrap();
        service.create(&product("A-2", 10)).await.unwrap();
        service.create(&product("A-3", 11)).await.unwrap();

        assert_eq!(service.low_stock(None).await.unwrap().len(), 2);
        assert_eq!(service.low_stock(Some(3)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_pagination() {
        let service = setup().await;
        let filter = ProductFilter {
            limit: 0,
            ..Default::default()
        };
        assert!(service.list(filter).await.is_err());
    }
}
