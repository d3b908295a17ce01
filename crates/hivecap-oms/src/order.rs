//! Order model for the admission queue

use chrono::Utc;
use hivecap_common::{AgentId, ColonyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sink::Fill;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

/// Where an order came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOrigin {
    pub colony_id: ColonyId,
    pub agent_id: AgentId,
}

/// An intended trade, not yet admitted
///
/// Built by the runtime from a simulation trade decision and handed to
/// [`crate::AdmissionQueue::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub origin: OrderOrigin,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Higher priorities are served first
    pub priority: u8,
}

/// Order lifecycle status
///
/// Valid transitions: Queued → Processing → {Filled, Rejected}, and
/// Queued → Cancelled before processing begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Queued,
    Processing,
    Filled,
    Rejected,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Queued => "queued",
            OrderStatus::Processing => "processing",
            OrderStatus::Filled => "filled",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// An order admitted into the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOrder {
    pub order_id: Uuid,
    pub origin: OrderOrigin,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub priority: u8,
    /// Admission time, Unix milliseconds
    pub enqueued_at: i64,
    pub status: OrderStatus,
}

impl QueuedOrder {
    /// Admit an intent, stamping id, time, and initial status
    pub fn from_intent(intent: OrderIntent) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            origin: intent.origin,
            symbol: intent.symbol,
            side: intent.side,
            quantity: intent.quantity,
            price: intent.price,
            priority: intent.priority,
            enqueued_at: Utc::now().timestamp_millis(),
            status: OrderStatus::Queued,
        }
    }

    /// Quantity × price
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// Terminal result of one admitted order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Filled(Fill),
    Rejected { reason: String },
}

/// Report emitted on the queue's report channel when an order resolves
///
/// The simulation scheduler drains these and routes them back into agent
/// state; they carry no economic effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub order: QueuedOrder,
    pub outcome: ExecutionOutcome,
}

impl ExecutionReport {
    /// Whether the order filled
    pub fn is_fill(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Filled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn intent() -> OrderIntent {
        OrderIntent {
            origin: OrderOrigin {
                colony_id: ColonyId(0),
                agent_id: AgentId(7),
            },
            symbol: "BTC-GBP".into(),
            side: Side::Buy,
            quantity: dec!(0.05),
            price: dec!(40000),
            priority: 10,
        }
    }

    #[test]
    fn test_from_intent_stamps_admission_fields() {
        let order = QueuedOrder::from_intent(intent());
        assert_eq!(order.status, OrderStatus::Queued);
        assert_eq!(order.priority, 10);
        assert!(order.enqueued_at > 0);
    }

    #[test]
    fn test_notional() {
        let order = QueuedOrder::from_intent(intent());
        assert_eq!(order.notional(), dec!(2000.00));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(OrderStatus::Queued.to_string(), "queued");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }
}
