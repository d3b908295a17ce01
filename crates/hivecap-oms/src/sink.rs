//! Order sink - the execution venue seen from the admission queue
//!
//! The venue is an opaque collaborator: it either fills a submitted order
//! or rejects it. The queue owns timeout handling; a sink that never
//! answers is resolved as rejected by the caller's deadline.

use async_trait::async_trait;
use hivecap_common::SinkError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::QueuedOrder;

/// Execution confirmation from the venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub filled_quantity: Decimal,
    pub avg_price: Decimal,
}

/// The venue that executes admitted orders
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Submit one order for execution
    async fn submit(&self, order: &QueuedOrder) -> Result<Fill, SinkError>;
}

/// Simulated venue: fills every order at its own limit price
///
/// Orders below the configured minimum notional are rejected, mirroring
/// the one venue-side check worth simulating.
#[derive(Debug, Clone)]
pub struct PaperSink {
    min_notional: Decimal,
}

impl PaperSink {
    pub fn new(min_notional: Decimal) -> Self {
        Self { min_notional }
    }
}

impl Default for PaperSink {
    fn default() -> Self {
        Self {
            min_notional: Decimal::ZERO,
        }
    }
}

#[async_trait]
impl OrderSink for PaperSink {
    async fn submit(&self, order: &QueuedOrder) -> Result<Fill, SinkError> {
        if order.notional() < self.min_notional {
            return Err(SinkError::Rejected {
                reason: format!(
                    "notional {} below venue minimum {}",
                    order.notional(),
                    self.min_notional
                ),
            });
        }
        Ok(Fill {
            filled_quantity: order.quantity,
            avg_price: order.price,
        })
    }
}
