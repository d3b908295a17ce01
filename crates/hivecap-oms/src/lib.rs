//! # Hivecap OMS
//!
//! The order admission layer between trade decisions and the execution
//! venue. Many agents decide at simulation cadence; the venue accepts
//! submissions at its own rate-limited cadence. The admission queue sits
//! between the two so neither blocks the other:
//!
//! ```text
//! agents ──enqueue──► AdmissionQueue ──process_tick──► OrderSink (venue)
//!                        │  priority order                 │
//!                        │  rate window                    ▼
//!                        └──◄── ExecutionReport channel ◄──┘
//! ```
//!
//! All queue mutation happens inside one critical section; the lock is
//! never held across sink I/O.

pub mod order;
pub mod queue;
pub mod sink;

pub use order::{
    ExecutionOutcome, ExecutionReport, OrderIntent, OrderOrigin, OrderStatus, QueuedOrder, Side,
};
pub use queue::{AdmissionConfig, AdmissionQueue, QueueStatsSnapshot, RateWindow};
pub use sink::{Fill, OrderSink, PaperSink};
