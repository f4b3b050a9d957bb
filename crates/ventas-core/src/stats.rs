//! # Order Statistics
//!
//! Read-only aggregation over per-state totals.
//!
//! ```text
//!   RecentWindows::ending_at(now)      boundaries for the recent counts
//!        │
//!        ▼
//!   SELECT state, COUNT(*), SUM(total_cents), SUM(CASE ...) × 3
//!   FROM orders GROUP BY state          (ventas-db, one row per state)
//!        │
//!        ▼
//!   OrderStatistics::from_state_totals(&rows)
//!        │
//!        ├── by_state        one counter per state (Σ = total_orders)
//!        ├── total_revenue   Σ total_cents
//!        ├── average_order   revenue / total_orders (0 when empty)
//!        └── recent          today / last 7 days / last 30 days
//! ```

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::OrderState;

/// Lower bounds of the recent-activity windows.
///
/// "Today" starts at UTC midnight of `now`; the 7 and 30 day windows are
/// rolling and include their lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentWindows {
    pub today_start: DateTime<Utc>,
    pub week_ago: DateTime<Utc>,
    pub month_ago: DateTime<Utc>,
}

impl RecentWindows {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let midnight = now.date_naive().and_time(NaiveTime::default());
        RecentWindows {
            today_start: Utc.from_utc_datetime(&midnight),
            week_ago: now - Duration::days(7),
            month_ago: now - Duration::days(30),
        }
    }
}

/// Aggregates for the orders in one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StateTotals {
    pub state: OrderState,
    pub orders: i64,
    pub revenue_cents: i64,
    pub today: i64,
    pub last_7_days: i64,
    pub last_30_days: i64,
}

/// Order count per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StateCounts {
    #[serde(rename = "pendiente")]
    pub pending: u64,
    #[serde(rename = "confirmado")]
    pub confirmed: u64,
    #[serde(rename = "enviado")]
    pub shipped: u64,
    #[serde(rename = "entregado")]
    pub delivered: u64,
    #[serde(rename = "cancelado")]
    pub cancelled: u64,
}

impl StateCounts {
    fn add(&mut self, state: OrderState, count: u64) {
        let slot = match state {
            OrderState::Pending => &mut self.pending,
            OrderState::Confirmed => &mut self.confirmed,
            OrderState::Shipped => &mut self.shipped,
            OrderState::Delivered => &mut self.delivered,
            OrderState::Cancelled => &mut self.cancelled,
        };
        *slot += count;
    }

    pub fn get(&self, state: OrderState) -> u64 {
        match state {
            OrderState::Pending => self.pending,
            OrderState::Confirmed => self.confirmed,
            OrderState::Shipped => self.shipped,
            OrderState::Delivered => self.delivered,
            OrderState::Cancelled => self.cancelled,
        }
    }

    pub fn total(&self) -> u64 {
        OrderState::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Orders created within recent windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecentActivity {
    pub today: u64,
    pub last_7_days: u64,
    pub last_30_days: u64,
}

/// Aggregated order figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderStatistics {
    pub total_orders: u64,
    pub by_state: StateCounts,
    /// Sum of all order totals, cancelled orders included.
    pub total_revenue: Money,
    pub average_order_value: Money,
    pub recent: RecentActivity,
}

impl OrderStatistics {
    /// Assembles the statistics from per-state rows.
    ///
    /// States with no orders may be absent from `rows`.
    pub fn from_state_totals(rows: &[StateTotals]) -> Self {
        let mut stats = OrderStatistics::default();
        for row in rows {
            let orders = count(row.orders);
            stats.total_orders += orders;
            stats.by_state.add(row.state, orders);
            stats.total_revenue = stats
                .total_revenue
                .checked_add(Money::from_cents(row.revenue_cents))
                .unwrap_or(Money::from_cents(i64::MAX));
            stats.recent.today += count(row.today);
            stats.recent.last_7_days += count(row.last_7_days);
            stats.recent.last_30_days += count(row.last_30_days);
        }

        stats.average_order_value = stats.total_revenue.average_over(stats.total_orders);
        stats
    }
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(state: OrderState, orders: i64, revenue_cents: i64, recent: [i64; 3]) -> StateTotals {
        StateTotals {
            state,
            orders,
            revenue_cents,
            today: recent[0],
            last_7_days: recent[1],
            last_30_days: recent[2],
        }
    }

    #[test]
    fn test_empty_statistics() {
        let stats = OrderStatistics::from_state_totals(&[]);
        assert_eq!(stats.total_orders, 0);
        assert!(stats.total_revenue.is_zero());
        assert!(stats.average_order_value.is_zero());
        assert_eq!(stats.by_state.total(), 0);
    }

    #[test]
    fn test_counts_revenue_and_average() {
        let rows = [
            totals(OrderState::Pending, 2, 30998, [2, 2, 2]),
            totals(OrderState::Delivered, 1, 5000, [0, 1, 1]),
            totals(OrderState::Cancelled, 1, 2001, [0, 0, 1]),
            totals(OrderState::Shipped, 1, 1, [0, 0, 0]),
        ];

        let stats = OrderStatistics::from_state_totals(&rows);

        assert_eq!(stats.total_orders, 5);
        assert_eq!(stats.by_state.pending, 2);
        assert_eq!(stats.by_state.delivered, 1);
        assert_eq!(stats.by_state.cancelled, 1);
        assert_eq!(stats.by_state.shipped, 1);
        assert_eq!(stats.by_state.confirmed, 0);
        assert_eq!(stats.by_state.total(), stats.total_orders);

        assert_eq!(stats.total_revenue.cents(), 38000);
        assert_eq!(stats.average_order_value.cents(), 7600);

        assert_eq!(stats.recent.today, 2);
        assert_eq!(stats.recent.last_7_days, 3);
        assert_eq!(stats.recent.last_30_days, 4);
    }

    #[test]
    fn test_today_starts_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 0, 30, 0).unwrap();
        let windows = RecentWindows::ending_at(now);

        assert_eq!(windows.today_start, Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap());
        assert_eq!(windows.week_ago, Utc.with_ymd_and_hms(2024, 5, 13, 0, 30, 0).unwrap());
        assert_eq!(windows.month_ago, Utc.with_ymd_and_hms(2024, 4, 20, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_state_counts_serialize_with_wire_tags() {
        let json = serde_json::to_value(StateCounts::default()).unwrap();
        assert!(json.get("pendiente").is_some());
        assert!(json.get("cancelado").is_some());
    }
}
