//! # Order Rules
//!
//! Pricing of order requests and the order state machine.
//!
//! ## Create Order Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request lines ──► merge_lines ──► price_order ──► persist (ventas-db)  │
//! │                      │                 │                                │
//! │                      │                 ├── missing products?            │
//! │                      │                 │     → ProductsNotFound         │
//! │                      │                 ├── qty > stock?                 │
//! │                      │                 │     → InsufficientStock        │
//! │                      │                 └── subtotal = qty × unit price  │
//! │                      │                     total = Σ subtotals          │
//! │                      ├── empty list → Validation                        │
//! │                      ├── qty <= 0   → Validation                        │
//! │                      └── duplicates summed                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check here runs against a snapshot; the database layer repeats
//! it atomically with a conditional update inside the order transaction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{OrderState, Product};
use crate::validation::{validate_line_count, validate_quantity};

// =============================================================================
// Pricing
// =============================================================================

/// One requested line: a product and how many units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// The product data pricing needs, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedProduct {
    pub id: i64,
    pub code: String,
    pub price: Money,
    pub stock: i64,
}

impl From<&Product> for PricedProduct {
    fn from(product: &Product) -> Self {
        PricedProduct {
            id: product.id,
            code: product.code.clone(),
            price: product.price(),
            stock: product.stock,
        }
    }
}

/// A line with its unit price snapshot and subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Result of pricing an order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Validates request lines and merges duplicate products.
///
/// Lines keep the order in which each product first appears; quantities of
/// repeated product ids are summed.
///
/// ## Example
/// ```rust
/// use ventas_core::order::{merge_lines, LineRequest};
///
/// let merged = merge_lines(&[
///     LineRequest { product_id: 1, quantity: 2 },
///     LineRequest { product_id: 2, quantity: 1 },
///     LineRequest { product_id: 1, quantity: 3 },
/// ]).unwrap();
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].quantity, 5);
/// ```
pub fn merge_lines(lines: &[LineRequest]) -> CoreResult<Vec<LineRequest>> {
    validate_line_count(lines.len())?;

    let mut merged: Vec<LineRequest> = Vec::with_capacity(lines.len());
    let mut positions: HashMap<i64, usize> = HashMap::with_capacity(lines.len());

    for line in lines {
        validate_quantity(line.quantity)?;
        match positions.get(&line.product_id) {
            Some(&idx) => {
                let quantity = merged[idx].quantity.saturating_add(line.quantity);
                merged[idx].quantity = quantity;
            }
            None => {
                positions.insert(line.product_id, merged.len());
                merged.push(*line);
            }
        }
    }

    for line in &merged {
        validate_quantity(line.quantity)?;
    }

    Ok(merged)
}

/// Prices an order request against the resolved products.
///
/// `products` may be in any order and may contain extra entries. Every
/// product id in `lines` must be present, otherwise the missing ids are
/// reported together.
pub fn price_order(lines: &[LineRequest], products: &[PricedProduct]) -> CoreResult<PricedOrder> {
    let lines = merge_lines(lines)?;
    let by_id: HashMap<i64, &PricedProduct> = products.iter().map(|p| (p.id, p)).collect();

    let missing: Vec<i64> = lines
        .iter()
        .filter(|l| !by_id.contains_key(&l.product_id))
        .map(|l| l.product_id)
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::ProductsNotFound { missing });
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in &lines {
        let Some(product) = by_id.get(&line.product_id) else {
            continue;
        };

        if line.quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                code: product.code.clone(),
                available: product.stock,
                required: line.quantity,
            });
        }

        let subtotal = product
            .price
            .multiply_quantity(line.quantity)
            .ok_or_else(|| amount_overflow("subtotal_cents"))?;
        priced.push(PricedLine {
            product_id: product.id,
            quantity: line.quantity,
            unit_price: product.price,
            subtotal,
        });
    }

    let total = priced.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.subtotal)
            .ok_or_else(|| amount_overflow("total_cents"))
    })?;
    Ok(PricedOrder {
        lines: priced,
        total,
    })
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// State Machine
// =============================================================================

/// States reachable from `from` in one step.
pub const fn allowed_transitions(from: OrderState) -> &'static [OrderState] {
    match from {
        OrderState::Pending => &[OrderState::Confirmed, OrderState::Cancelled],
        OrderState::Confirmed => &[OrderState::Shipped, OrderState::Cancelled],
        OrderState::Shipped => &[OrderState::Delivered],
        OrderState::Delivered | OrderState::Cancelled => &[],
    }
}

/// Checks a requested state change against the transition table.
///
/// Self-transitions are rejected like any other move missing from the table.
pub fn validate_transition(from: OrderState, to: OrderState) -> CoreResult<()> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { from, to })
    }
}

// =============================================================================
// Cancellation Policy
// =============================================================================

/// How strictly cancellation follows the transition table.
///
/// ## Variants
/// - `Legacy`: only delivered and already cancelled orders are refused,
///   so a shipped order can still be cancelled.
/// - `TransitionTable`: cancellation must also be a valid transition,
///   which refuses shipped orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    #[default]
    Legacy,
    TransitionTable,
}

impl CancellationPolicy {
    /// Checks whether an order in `state` may be cancelled.
    pub fn check(&self, order_id: i64, state: OrderState) -> CoreResult<()> {
        match state {
            OrderState::Cancelled => return Err(CoreError::AlreadyCancelled { order_id }),
            OrderState::Delivered => return Err(CoreError::CannotCancelDelivered { order_id }),
            _ => {}
        }

        match self {
            CancellationPolicy::Legacy => Ok(()),
            CancellationPolicy::TransitionTable => {
                validate_transition(state, OrderState::Cancelled)
            }
        }
    }
}

impl fmt::Display for CancellationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationPolicy::Legacy => f.write_str("legacy"),
            CancellationPolicy::TransitionTable => f.write_str("strict"),
        }
    }
}

impl FromStr for CancellationPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(CancellationPolicy::Legacy),
            "strict" | "transition_table" => Ok(CancellationPolicy::TransitionTable),
            _ => Err(ValidationError::NotAllowed {
                field: "cancellation_policy".to_string(),
                allowed: vec!["legacy".to_string(), "strict".to_string()],
            }),
        }
    }
}

// =============================================================================
// Stock Reduction
// =============================================================================

/// Behaviour of a stock reduction that asks for more than is on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockReduction {
    /// Refuse the reduction; stock is left untouched.
    #[default]
    Exact,
    /// Floor the result at zero.
    ClampAtZero,
}

impl StockReduction {
    /// Computes the stock left after removing `qty` units.
    ///
    /// Returns `None` when `Exact` cannot be satisfied.
    ///
    /// ## Example
    /// ```rust
    /// use ventas_core::StockReduction;
    ///
    /// assert_eq!(StockReduction::Exact.apply(10, 4), Some(6));
    /// assert_eq!(StockReduction::Exact.apply(3, 4), None);
    /// assert_eq!(StockReduction::ClampAtZero.apply(3, 4), Some(0));
    /// ```
    pub const fn apply(&self, current: i64, qty: i64) -> Option<i64> {
        match self {
            StockReduction::Exact if current < qty => None,
            StockReduction::Exact => Some(current - qty),
            StockReduction::ClampAtZero if current < qty => Some(0),
            StockReduction::ClampAtZero => Some(current - qty),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price: i64, stock: i64) -> PricedProduct {
        PricedProduct {
            id,
            code: format!("P-{id:03}"),
            price: Money::from_cents(price),
            stock,
        }
    }

    fn line(product_id: i64, quantity: i64) -> LineRequest {
        LineRequest {
            product_id,
            quantity,
        }
    }

    #[test]
    fn test_price_order_totals() {
        let products = [product(1, 8999, 10), product(2, 12000, 5)];
        let priced = price_order(&[line(1, 2), line(2, 1)], &products).unwrap();

        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].unit_price.cents(), 8999);
        assert_eq!(priced.lines[0].subtotal.cents(), 17998);
        assert_eq!(priced.lines[1].subtotal.cents(), 12000);
        assert_eq!(priced.total.cents(), 29998);

        let sum: Money = priced.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(sum, priced.total);
    }

    #[test]
    fn test_price_order_insufficient_stock() {
        let products = [product(7, 100_000, 50)];
        let err = price_order(&[line(7, 100)], &products).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: 7,
                code: "P-007".to_string(),
                available: 50,
                required: 100,
            }
        );
    }

    #[test]
    fn test_price_order_exact_stock_is_enough() {
        let products = [product(1, 500, 3)];
        assert!(price_order(&[line(1, 3)], &products).is_ok());
    }

    #[test]
    fn test_price_order_amount_overflow_is_a_validation_error() {
        let products = [product(1, i64::MAX / 2, 10), product(2, i64::MAX / 4, 10)];

        let err = price_order(&[line(1, 3)], &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "subtotal_cents"
        ));

        let err = price_order(&[line(1, 2), line(2, 2)], &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "total_cents"
        ));
    }

    #[test]
    fn test_price_order_reports_all_missing_products() {
        let products = [product(1, 500, 3)];
        let err = price_order(&[line(1, 1), line(8, 1), line(9, 2)], &products).unwrap_err();
        assert_eq!(err, CoreError::ProductsNotFound { missing: vec![8, 9] });
    }

    #[test]
    fn test_price_order_rejects_empty_and_non_positive() {
        let products = [product(1, 500, 3)];
        assert!(matches!(
            price_order(&[], &products),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            price_order(&[line(1, 0)], &products),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[test]
    fn test_duplicate_lines_are_merged_before_stock_check() {
        let products = [product(1, 500, 4)];
        let err = price_order(&[line(1, 3), line(1, 2)], &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 4,
                required: 5,
                ..
            }
        ));

        let priced = price_order(&[line(1, 2), line(1, 2)], &products).unwrap();
        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.lines[0].quantity, 4);
        assert_eq!(priced.total.cents(), 2000);
    }

    #[test]
    fn test_full_transition_table() {
        use OrderState::*;
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Shipped),
            (Confirmed, Cancelled),
            (Shipped, Delivered),
        ];

        for from in OrderState::ALL {
            for to in OrderState::ALL {
                let result = validate_transition(from, to);
                if allowed.contains(&(from, to)) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    assert_eq!(
                        result,
                        Err(CoreError::InvalidTransition { from, to }),
                        "{from} -> {to} should be refused"
                    );
                }
            }
        }
    }

    #[test]
    fn test_pending_to_delivered_is_invalid() {
        let err = validate_transition(OrderState::Pending, OrderState::Delivered).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid order state transition from pendiente to entregado"
        );
    }

    #[test]
    fn test_cancellation_policy_legacy() {
        let policy = CancellationPolicy::Legacy;
        assert!(policy.check(1, OrderState::Pending).is_ok());
        assert!(policy.check(1, OrderState::Confirmed).is_ok());
        assert!(policy.check(1, OrderState::Shipped).is_ok());
        assert_eq!(
            policy.check(1, OrderState::Cancelled),
            Err(CoreError::AlreadyCancelled { order_id: 1 })
        );
        assert_eq!(
            policy.check(1, OrderState::Delivered),
            Err(CoreError::CannotCancelDelivered { order_id: 1 })
        );
    }

    #[test]
    fn test_cancellation_policy_strict() {
        let policy = CancellationPolicy::TransitionTable;
        assert!(policy.check(2, OrderState::Pending).is_ok());
        assert_eq!(
            policy.check(2, OrderState::Shipped),
            Err(CoreError::InvalidTransition {
                from: OrderState::Shipped,
                to: OrderState::Cancelled,
            })
        );
        assert_eq!(
            policy.check(2, OrderState::Delivered),
            Err(CoreError::CannotCancelDelivered { order_id: 2 })
        );
    }

    #[test]
    fn test_cancellation_policy_parse() {
        assert_eq!("legacy".parse::<CancellationPolicy>(), Ok(CancellationPolicy::Legacy));
        assert_eq!("STRICT".parse::<CancellationPolicy>(), Ok(CancellationPolicy::TransitionTable));
        assert!("loose".parse::<CancellationPolicy>().is_err());
        assert_eq!(CancellationPolicy::default(), CancellationPolicy::Legacy);
    }

    #[test]
    fn test_stock_reduction_modes() {
        assert_eq!(StockReduction::Exact.apply(5, 5), Some(0));
        assert_eq!(StockReduction::Exact.apply(5, 6), None);
        assert_eq!(StockReduction::ClampAtZero.apply(5, 6), Some(0));
        assert_eq!(StockReduction::ClampAtZero.apply(5, 2), Some(3));
    }
}
