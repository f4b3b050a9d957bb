//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     ├── customer active?      → NotFound                               │
//! │     ├── user exists?          → NotFound                               │
//! │     ├── products resolved     → ProductsNotFound                       │
//! │     ├── price lines           → InsufficientStock                      │
//! │     ├── INSERT orders + order_line_items                               │
//! │     └── stock -= qty WHERE stock >= qty  (0 rows → roll back)          │
//! │                                                                         │
//! │  2. TRANSITION                                                         │
//! │     └── UPDATE orders SET state = ? WHERE id = ? AND state = ?         │
//! │                                                                         │
//! │  3. CANCEL (one transaction)                                           │
//! │     ├── state → cancelado (conditional)                                │
//! │     └── stock += qty for every line                                    │
//! │                                                                         │
//! │  4. HARD DELETE (admin)                                                │
//! │     └── DELETE orders → order_line_items cascade, stock untouched      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::{find_active_by_ids_in, increase_stock_in, reduce_stock_in};
use ventas_core::order::{price_order, validate_transition, LineRequest, PricedProduct};
use ventas_core::stats::{RecentWindows, StateTotals};
use ventas_core::{
    CancellationPolicy, CoreError, Order, OrderDetail, OrderLineItem, OrderState, StockReduction,
};

/// Input for creating an order. Lines should already be merged.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub user_id: i64,
    pub lines: Vec<LineRequest>,
    /// Stored as given (already encrypted by the caller).
    pub notes: Option<String>,
}

/// Filters for listing orders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    pub state: Option<OrderState>,
    pub customer_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        OrderFilter {
            state: None,
            customer_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order with its line items and takes the stock.
    ///
    /// Everything happens in one transaction: if any step fails nothing is
    /// written. Stock is taken with a conditional update, so a concurrent
    /// order that drained the product between pricing and commit makes this
    /// call fail with `InsufficientStock` instead of driving stock negative.
    pub async fn create(&self, input: &NewOrder) -> DbResult<OrderDetail> {
        debug!(
            customer_id = %input.customer_id,
            user_id = %input.user_id,
            lines = input.lines.len(),
            "Creating order"
        );

        let mut tx = self.begin_immediate().await?;

        let customer: Option<i64> =
            sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1 AND is_active = 1")
                .bind(input.customer_id)
                .fetch_optional(&mut *tx)
                .await?;
        if customer.is_none() {
            return Err(DbError::not_found("Customer", input.customer_id));
        }

        let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?1")
            .bind(input.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(DbError::not_found("User", input.user_id));
        }

        let ids: Vec<i64> = input.lines.iter().map(|l| l.product_id).collect();
        let products: Vec<PricedProduct> = find_active_by_ids_in(&mut tx, &ids)
            .await?
            .iter()
            .map(PricedProduct::from)
            .collect();
        let priced = price_order(&input.lines, &products)?;

        let now = Utc::now();
        let order: Order = sqlx::query_as(
            r#"
            INSERT INTO orders (customer_id, user_id, order_date, total_cents, state, notes, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?3)
            RETURNING *
            "#,
        )
        .bind(input.customer_id)
        .bind(input.user_id)
        .bind(now)
        .bind(priced.total.cents())
        .bind(OrderState::Pending)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let item: OrderLineItem = sqlx::query_as(
                r#"
                INSERT INTO order_line_items (order_id, product_id, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING *
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.subtotal.cents())
            .fetch_one(&mut *tx)
            .await?;

            reduce_stock_in(&mut tx, line.product_id, line.quantity, StockReduction::Exact).await?;
            items.push(item);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %order.id, total = %priced.total, "Order created");
        Ok(OrderDetail { order, items })
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets all line items of an order, in insertion order.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderLineItem>> {
        let mut conn = self.pool.acquire().await?;
        items_in(&mut conn, order_id).await
    }

    /// Gets an order together with its line items.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<OrderDetail>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// Lists orders matching the filter, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as(
            r#"
            SELECT * FROM orders
            WHERE (?1 IS NULL OR state = ?1)
              AND (?2 IS NULL OR customer_id = ?2)
            ORDER BY order_date DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(filter.state)
        .bind(filter.customer_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Moves an order to `to` following the transition table.
    ///
    /// A move to cancelled goes through [`cancel`](Self::cancel) so the stock
    /// comes back.
    pub async fn transition(&self, id: i64, to: OrderState) -> DbResult<OrderDetail> {
        let from = self.current_state(id).await?;
        validate_transition(from, to)?;

        if to == OrderState::Cancelled {
            return self.cancel(id, CancellationPolicy::TransitionTable).await;
        }

        debug!(id = %id, from = %from, to = %to, "Transitioning order");

        let updated: Option<Order> = sqlx::query_as(
            "UPDATE orders SET state = ?3, updated_at = ?4 WHERE id = ?1 AND state = ?2 RETURNING *",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let Some(order) = updated else {
            // Someone else moved the order after we read it.
            let now_in = self.current_state(id).await?;
            return Err(CoreError::InvalidTransition { from: now_in, to }.into());
        };

        info!(id = %id, state = %to, "Order state changed");
        let items = self.get_items(id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Cancels an order and returns every line's quantity to stock.
    ///
    /// The state change and the stock restorations commit together.
    pub async fn cancel(&self, id: i64, policy: CancellationPolicy) -> DbResult<OrderDetail> {
        debug!(id = %id, policy = %policy, "Cancelling order");

        let mut tx = self.begin_immediate().await?;

        let state = state_in(&mut tx, id).await?;
        policy.check(id, state)?;

        let updated: Option<Order> = sqlx::query_as(
            "UPDATE orders SET state = ?3, updated_at = ?4 WHERE id = ?1 AND state = ?2 RETURNING *",
        )
        .bind(id)
        .bind(state)
        .bind(OrderState::Cancelled)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = updated else {
            let now_in = state_in(&mut tx, id).await?;
            policy.check(id, now_in)?;
            return Err(CoreError::InvalidTransition {
                from: now_in,
                to: OrderState::Cancelled,
            }
            .into());
        };

        let items = items_in(&mut tx, id).await?;
        for item in &items {
            increase_stock_in(&mut tx, item.product_id, item.quantity).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, restored_lines = items.len(), "Order cancelled");
        Ok(OrderDetail { order, items })
    }

    /// Deletes an order row; line items cascade. Stock is not touched.
    pub async fn hard_delete(&self, id: i64) -> DbResult<()> {
        info!(id = %id, "Hard-deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Order count, revenue and recent counts per state, in one pass.
    ///
    /// States without orders are absent from the result.
    pub async fn state_totals(&self, windows: RecentWindows) -> DbResult<Vec<StateTotals>> {
        let totals = sqlx::query_as(
            r#"
            SELECT state,
                   COUNT(*)                                          AS orders,
                   COALESCE(SUM(total_cents), 0)                     AS revenue_cents,
                   COALESCE(SUM(CASE WHEN order_date >= ?1 THEN 1 ELSE 0 END), 0) AS today,
                   COALESCE(SUM(CASE WHEN order_date >= ?2 THEN 1 ELSE 0 END), 0) AS last_7_days,
                   COALESCE(SUM(CASE WHEN order_date >= ?3 THEN 1 ELSE 0 END), 0) AS last_30_days
            FROM orders
            GROUP BY state
            "#,
        )
        .bind(windows.today_start)
        .bind(windows.week_ago)
        .bind(windows.month_ago)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Opens a transaction holding the write lock from BEGIN.
    ///
    /// Reads inside it stay current until commit; concurrent writers queue on
    /// the busy timeout instead of failing at their first write.
    async fn begin_immediate(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    async fn current_state(&self, id: i64) -> DbResult<OrderState> {
        let mut conn = self.pool.acquire().await?;
        state_in(&mut conn, id).await
    }
}

async fn state_in(conn: &mut SqliteConnection, id: i64) -> DbResult<OrderState> {
    let state: Option<OrderState> = sqlx::query_scalar("SELECT state FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    state.ok_or_else(|| DbError::not_found("Order", id))
}

async fn items_in(conn: &mut SqliteConnection, order_id: i64) -> DbResult<Vec<OrderLineItem>> {
    let items = sqlx::query_as("SELECT * FROM order_line_items WHERE order_id = ?1 ORDER BY id")
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
