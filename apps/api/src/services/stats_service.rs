//! Order statistics and the dashboard summary.

use chrono::Utc;
use serde::Serialize;
use ventas_core::stats::RecentWindows;
use ventas_core::OrderStatistics;
use ventas_db::{CustomerRepository, OrderRepository, ProductRepository, UserRepository};

use crate::error::ServiceResult;

/// Body of `GET /api/statistics/dashboard`.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub active_customers: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub low_stock_threshold: i64,
    pub active_users: i64,
    pub orders: OrderStatistics,
}

#[derive(Clone)]
pub struct StatsService {
    orders: OrderRepository,
    products: ProductRepository,
    customers: CustomerRepository,
    users: UserRepository,
    low_stock_threshold: i64,
}

impl StatsService {
    pub fn new(
        orders: OrderRepository,
        products: ProductRepository,
        customers: CustomerRepository,
        users: UserRepository,
        low_stock_threshold: i64,
    ) -> Self {
        StatsService {
            orders,
            products,
            customers,
            users,
            low_stock_threshold,
        }
    }

    pub async fn order_statistics(&self) -> ServiceResult<OrderStatistics> {
        let windows = RecentWindows::ending_at(Utc::now());
        let totals = self.orders.state_totals(windows).await?;
        Ok(OrderStatistics::from_state_totals(&totals))
    }

    pub async fn dashboard(&self) -> ServiceResult<Dashboard> {
        Ok(Dashboard {
            active_customers: self.customers.count_active().await?,
            active_products: self.products.count_active().await?,
            low_stock_products: self.products.count_low_stock(self.low_stock_threshold).await?,
            low_stock_threshold: self.low_stock_threshold,
            active_users: self.users.count_active().await?,
            orders: self.order_statistics().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ventas_core::order::LineRequest;
    use ventas_core::{CancellationPolicy, DocumentType, Money, NewCustomer, NewProduct, Role};
    use ventas_db::{Database, DbConfig, NewOrder};

    #[tokio::test]
    async fn test_empty_dashboard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = StatsService::new(db.orders(), db.products(), db.customers(), db.users(), 10);

        let dashboard = service.dashboard().await.unwrap();
        assert_eq!(dashboard.active_customers, 0);
        assert_eq!(dashboard.orders.total_orders, 0);
        assert_eq!(dashboard.orders.average_order_value, Money::zero());
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = StatsService::new(db.orders(), db.products(), db.customers(), db.users(), 10);

        let user = db.users().insert("V", "v@ventas.local", "x", Role::Vendedor).await.unwrap();
        let customer = db
            .customers()
            .insert(&NewCustomer {
                document: "52987654".into(),
                document_type: DocumentType::Cedula,
                name: "Maria".into(),
                email: "maria@example.com".into(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                code: "CAB-01".into(),
                name: "Cable".into(),
                description: None,
                price_cents: 2_500,
                stock: 20,
                category: None,
            })
            .await
            .unwrap();

        for quantity in [2, 4] {
            db.orders()
                .create(&NewOrder {
                    customer_id: customer.id,
                    user_id: user.id,
                    lines: vec![LineRequest {
                        product_id: product.id,
                        quantity,
                    }],
                    notes: None,
                })
                .await
                .unwrap();
        }
        let first = db.orders().list(&Default::default()).await.unwrap();
        db.orders()
            .cancel(first[0].id, CancellationPolicy::Legacy)
            .await
            .unwrap();

        let dashboard = service.dashboard().await.unwrap();
        assert_eq!(dashboard.active_customers, 1);
        assert_eq!(dashboard.active_products, 1);
        assert_eq!(dashboard.low_stock_products, 0);
        assert_eq!(dashboard.active_users, 1);
        assert_eq!(dashboard.orders.total_orders, 2);
        assert_eq!(dashboard.orders.by_state.pending, 1);
        assert_eq!(dashboard.orders.by_state.cancelled, 1);
        assert_eq!(dashboard.orders.total_revenue, Money::from_cents(15_000));
        assert_eq!(dashboard.orders.average_order_value, Money::from_cents(7_500));
        assert_eq!(dashboard.orders.recent.today, 2);
    }
}
