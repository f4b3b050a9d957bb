//! # Order Service
//!
//! The order workflow as seen from the API: request validation, notes
//! encryption and the configured cancellation policy. Atomicity lives in
//! [`OrderRepository`].
//!
//! ```text
//! POST /api/orders
//!      │
//!      ▼
//! merge_lines ── validate_notes ── encrypt notes
//!      │
//!      ▼
//! OrderRepository::create   (one transaction, stock taken conditionally)
//!      │
//!      ▼
//! decrypt notes ──► OrderDetail
//! ```

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use ventas_core::order::{merge_lines, LineRequest};
use ventas_core::validation::{validate_notes, validate_pagination};
use ventas_core::{CancellationPolicy, CoreError, Order, OrderDetail, OrderState, User};
use ventas_db::{NewOrder, OrderFilter, OrderRepository};

use crate::crypto::FieldCipher;
use crate::error::ServiceResult;

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    cipher: Arc<FieldCipher>,
    policy: CancellationPolicy,
}

impl OrderService {
    pub fn new(orders: OrderRepository, cipher: Arc<FieldCipher>, policy: CancellationPolicy) -> Self {
        OrderService {
            orders,
            cipher,
            policy,
        }
    }

    pub fn cancellation_policy(&self) -> CancellationPolicy {
        self.policy
    }

    /// Registers an order placed through `acting`.
    pub async fn create(&self, acting: &User, request: &CreateOrderRequest) -> ServiceResult<OrderDetail> {
        let lines = merge_lines(&request.items)?;

        let notes = match request.notes.as_deref().map(str::trim) {
            Some(notes) if !notes.is_empty() => {
                validate_notes(notes)?;
                Some(self.cipher.encrypt(notes)?)
            }
            _ => None,
        };

        let detail = self
            .orders
            .create(&NewOrder {
                customer_id: request.customer_id,
                user_id: acting.id,
                lines,
                notes,
            })
            .await?;

        info!(
            order_id = %detail.order.id,
            user_id = %acting.id,
            total = %detail.order.total(),
            "Order registered"
        );
        self.reveal_detail(detail)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<OrderDetail> {
        let detail = self
            .orders
            .get_detail(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;
        self.reveal_detail(detail)
    }

    pub async fn list(&self, filter: &OrderFilter) -> ServiceResult<Vec<Order>> {
        validate_pagination(filter.limit, filter.offset)?;
        self.orders
            .list(filter)
            .await?
            .into_iter()
            .map(|order| self.reveal(order))
            .collect()
    }

    /// Moves an order along the transition table.
    pub async fn transition(&self, id: i64, to: OrderState) -> ServiceResult<OrderDetail> {
        let detail = self.orders.transition(id, to).await?;
        self.reveal_detail(detail)
    }

    /// Cancels under the configured policy and restores stock.
    pub async fn cancel(&self, id: i64) -> ServiceResult<OrderDetail> {
        let detail = self.orders.cancel(id, self.policy).await?;
        self.reveal_detail(detail)
    }

    /// Removes the order and its lines without touching stock.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.orders.hard_delete(id).await?;
        Ok(())
    }

    fn reveal(&self, mut order: Order) -> ServiceResult<Order> {
        order.notes = self.cipher.decrypt_opt(order.notes.as_deref())?;
        Ok(order)
    }

    fn reveal_detail(&self, detail: OrderDetail) -> ServiceResult<OrderDetail> {
        Ok(OrderDetail {
            order: self.reveal(detail.order)?,
            items: detail.items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use ventas_core::{DocumentType, NewCustomer, NewProduct, Role};
    use ventas_db::{Database, DbConfig, DbError};

    struct Fixture {
        db: Database,
        service: OrderService,
        seller: User,
        customer_id: i64,
        mouse: i64,
        keyboard: i64,
    }

    async fn setup(policy: CancellationPolicy) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cipher = Arc::new(FieldCipher::from_secret("notes-key").unwrap());
        let service = OrderService::new(db.orders(), cipher, policy);

        let seller = db
            .users()
            .insert("Vendedor", "v@ventas.local", "x", Role::Vendedor)
            .await
            .unwrap();
        let customer = db
            .customers()
            .insert(&NewCustomer {
                document: "1020304050".into(),
                document_type: DocumentType::Cedula,
                name: "Carlos".into(),
                email: "carlos@example.com".into(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (code, price, stock) in [("MOU-01", 8_999, 10), ("KEY-01", 12_000, 5)] {
            let p = db
                .products()
                .insert(&NewProduct {
                    code: code.into(),
                    name: code.into(),
                    description: None,
                    price_cents: price,
                    stock,
                    category: None,
                })
                .await
                .unwrap();
            ids.push(p.id);
        }

        Fixture {
            db,
            service,
            seller,
            customer_id: customer.id,
            mouse: ids[0],
            keyboard: ids[1],
        }
    }

    fn request(f: &Fixture, lines: &[(i64, i64)], notes: Option<&str>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer_id: f.customer_id,
            items: lines
                .iter()
                .map(|&(product_id, quantity)| LineRequest { product_id, quantity })
                .collect(),
            notes: notes.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_prices_from_catalog() {
        let f = setup(CancellationPolicy::Legacy).await;
        let req = request(&f, &[(f.mouse, 2), (f.keyboard, 1)], None);

        let detail = f.service.create(&f.seller, &req).await.unwrap();

        assert_eq!(detail.order.total_cents, 29_998);
        assert_eq!(detail.order.state, OrderState::Pending);
        assert_eq!(detail.order.user_id, f.seller.id);
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].subtotal_cents, 17_998);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_merged() {
        let f = setup(CancellationPolicy::Legacy).await;
        let req = request(&f, &[(f.mouse, 2), (f.mouse, 3)], None);

        let detail = f.service.create(&f.seller, &req).await.unwrap();

        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 5);
        let mouse = f.db.products().get_by_id(f.mouse).await.unwrap().unwrap();
        assert_eq!(mouse.stock, 5);
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_storage() {
        let f = setup(CancellationPolicy::Legacy).await;

        let empty = request(&f, &[], None);
        assert!(matches!(
            f.service.create(&f.seller, &empty).await,
            Err(ServiceError::Core(CoreError::Validation(_)))
        ));

        let zero = request(&f, &[(f.mouse, 0)], None);
        assert!(matches!(
            f.service.create(&f.seller, &zero).await,
            Err(ServiceError::Core(CoreError::Validation(_)))
        ));

        let long_notes = "x".repeat(1001);
        let noisy = request(&f, &[(f.mouse, 1)], Some(&long_notes));
        assert!(f.service.create(&f.seller, &noisy).await.is_err());

        assert!(f.service.list(&OrderFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notes_encrypted_at_rest() {
        let f = setup(CancellationPolicy::Legacy).await;
        let req = request(&f, &[(f.mouse, 1)], Some("  dejar en porteria "));

        let detail = f.service.create(&f.seller, &req).await.unwrap();
        assert_eq!(detail.order.notes.as_deref(), Some("dejar en porteria"));

        let stored = f.db.orders().get_by_id(detail.order.id).await.unwrap().unwrap();
        let raw = stored.notes.unwrap();
        assert!(raw.starts_with("enc:v1:"));
        assert!(!raw.contains("porteria"));

        let fetched = f.service.get(detail.order.id).await.unwrap();
        assert_eq!(fetched.order.notes.as_deref(), Some("dejar en porteria"));

        let listed = f.service.list(&OrderFilter::default()).await.unwrap();
        assert_eq!(listed[0].notes.as_deref(), Some("dejar en porteria"));
    }

    #[tokio::test]
    async fn test_insufficient_stock() {
        let f = setup(CancellationPolicy::Legacy).await;
        let req = request(&f, &[(f.keyboard, 6)], None);

        assert!(matches!(
            f.service.create(&f.seller, &req).await,
            Err(ServiceError::Db(DbError::Rule(CoreError::InsufficientStock {
                available: 5,
                required: 6,
                ..
            })))
        ));
    }

    #[tokio::test]
    async fn test_cancel_follows_policy() {
        let legacy = setup(CancellationPolicy::Legacy).await;
        let req = request(&legacy, &[(legacy.mouse, 4)], None);
        let id = legacy.service.create(&legacy.seller, &req).await.unwrap().order.id;
        legacy.service.transition(id, OrderState::Confirmed).await.unwrap();
        legacy.service.transition(id, OrderState::Shipped).await.unwrap();

        let cancelled = legacy.service.cancel(id).await.unwrap();
        assert_eq!(cancelled.order.state, OrderState::Cancelled);
        let mouse = legacy.db.products().get_by_id(legacy.mouse).await.unwrap().unwrap();
        assert_eq!(mouse.stock, 10);

        let strict = setup(CancellationPolicy::TransitionTable).await;
        let req = request(&strict, &[(strict.mouse, 4)], None);
        let id = strict.service.create(&strict.seller, &req).await.unwrap().order.id;
        strict.service.transition(id, OrderState::Confirmed).await.unwrap();
        strict.service.transition(id, OrderState::Shipped).await.unwrap();

        assert!(matches!(
            strict.service.cancel(id).await,
            Err(ServiceError::Db(DbError::Rule(CoreError::InvalidTransition { .. })))
        ));
    }

    #[tokio::test]
    async fn test_get_unknown_order() {
        let f = setup(CancellationPolicy::Legacy).await;
        assert!(matches!(
            f.service.get(404).await,
            Err(ServiceError::Core(CoreError::NotFound { .. }))
        ));
        assert!(matches!(
            f.service.delete(404).await,
            Err(ServiceError::Db(DbError::NotFound { .. }))
        ));
    }
}
