//! Admission queue - leaky-bucket order management
//!
//! Decision-making (many agents, stepped frequently) and execution
//! throughput (bounded by the venue's rate limit) run at different rates.
//! The queue decouples them: producers enqueue intents at will, and a
//! drain tick forwards the highest-priority orders up to the rate budget
//! of the current window.
//!
//! Mutual exclusion: every queue mutation goes through one
//! `parking_lot::Mutex`. The lock is taken to select a batch and again to
//! resolve it, but never held across sink I/O. The rate budget counts
//! submission attempts, not fills; slots consumed by rejected or timed-out
//! orders are not refunded.

use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use hivecap_common::{QueueError, SinkError};

use crate::order::{ExecutionOutcome, ExecutionReport, OrderIntent, OrderStatus, QueuedOrder};
use crate::sink::OrderSink;

/// Admission queue configuration
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Maximum queued orders before enqueue rejects
    pub max_depth: usize,
    /// Submission attempts allowed per rate window
    pub limit_per_window: u32,
    /// Rate window length; the window resets (not slides) on expiry
    pub window_duration: Duration,
    /// Deadline after which an unanswered sink call counts as rejected
    pub sink_timeout: Duration,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_depth: 10_000,
            limit_per_window: 100,
            window_duration: Duration::from_millis(1000),
            sink_timeout: Duration::from_secs(5),
        }
    }
}

/// Fixed rate window over submission attempts
///
/// `orders_in_window` never exceeds `limit_per_window`; when the duration
/// elapses the window restarts from the current instant with a zero count.
#[derive(Debug, Clone)]
pub struct RateWindow {
    window_start: Instant,
    window_duration: Duration,
    orders_in_window: u32,
    limit_per_window: u32,
}

impl RateWindow {
    pub fn new(limit_per_window: u32, window_duration: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            window_duration,
            orders_in_window: 0,
            limit_per_window,
        }
    }

    /// Restart the window if its duration has elapsed
    pub fn roll(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= self.window_duration {
            self.window_start = now;
            self.orders_in_window = 0;
        }
    }

    /// Submission slots left in the current window
    pub fn available(&self) -> u32 {
        self.limit_per_window - self.orders_in_window
    }

    /// Consume submission slots; the caller never asks for more than
    /// `available`
    pub fn consume(&mut self, count: u32) {
        debug_assert!(count <= self.available());
        self.orders_in_window += count;
    }

    /// Submissions counted against the current window
    pub fn used(&self) -> u32 {
        self.orders_in_window
    }
}

/// Heap entry: priority desc, then admission order asc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    priority: u8,
    seq: u64,
    order_id: Uuid,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Cumulative queue counters
#[derive(Debug, Default)]
struct QueueStats {
    enqueued: AtomicU64,
    processed: AtomicU64,
    filled: AtomicU64,
    rejected: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
}

/// Serializable view of the cumulative counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatsSnapshot {
    pub enqueued: u64,
    pub processed: u64,
    pub filled: u64,
    pub rejected: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub queued_depth: usize,
}

struct QueueInner {
    heap: BinaryHeap<HeapEntry>,
    /// Live (queued or processing) orders only; terminal orders leave the book
    orders: HashMap<Uuid, QueuedOrder>,
    queued: usize,
    window: RateWindow,
    seq: u64,
}

/// Rate-limited, priority-ordered admission queue
///
/// Construction hands back the receiving half of the execution-report
/// channel; the simulation side drains it to route fills and rejections
/// back to the deciding agents.
pub struct AdmissionQueue {
    config: AdmissionConfig,
    inner: Mutex<QueueInner>,
    stats: QueueStats,
    report_tx: mpsc::UnboundedSender<ExecutionReport>,
}

impl AdmissionQueue {
    pub fn new(config: AdmissionConfig) -> (Self, mpsc::UnboundedReceiver<ExecutionReport>) {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let window = RateWindow::new(config.limit_per_window, config.window_duration);
        let queue = Self {
            config,
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                orders: HashMap::new(),
                queued: 0,
                window,
                seq: 0,
            }),
            stats: QueueStats::default(),
            report_tx,
        };
        (queue, report_rx)
    }

    /// Admit an intent, returning the queued depth after admission
    ///
    /// Fails with [`QueueError::Full`] when the configured maximum depth
    /// is reached; the caller may retry on a later step.
    pub fn enqueue(&self, intent: OrderIntent) -> Result<usize, QueueError> {
        let mut inner = self.inner.lock();
        if inner.queued >= self.config.max_depth {
            return Err(QueueError::Full {
                depth: inner.queued,
                max_depth: self.config.max_depth,
            });
        }

        let order = QueuedOrder::from_intent(intent);
        inner.seq += 1;
        let entry = HeapEntry {
            priority: order.priority,
            seq: inner.seq,
            order_id: order.order_id,
        };
        debug!(
            order_id = %order.order_id,
            origin = ?order.origin,
            priority = order.priority,
            "order admitted"
        );
        inner.orders.insert(order.order_id, order);
        inner.heap.push(entry);
        inner.queued += 1;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(inner.queued)
    }

    /// Cancel an order; succeeds only while it is still queued
    pub fn cancel(&self, order_id: Uuid) -> bool {
        let mut inner = self.inner.lock();
        let cancellable = matches!(
            inner.orders.get(&order_id),
            Some(order) if order.status == OrderStatus::Queued
        );
        if !cancellable {
            return false;
        }
        inner.orders.remove(&order_id);
        inner.queued -= 1;
        // The heap entry goes stale and is skipped on pop
        self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(%order_id, "order cancelled");
        true
    }

    /// Cancel every queued order, returning how many were swept
    ///
    /// Shutdown path: processing orders are left to resolve through their
    /// sink deadline.
    pub fn cancel_all_queued(&self) -> usize {
        let mut inner = self.inner.lock();
        let queued_ids: Vec<Uuid> = inner
            .orders
            .iter()
            .filter(|(_, o)| o.status == OrderStatus::Queued)
            .map(|(id, _)| *id)
            .collect();
        for id in &queued_ids {
            inner.orders.remove(id);
        }
        inner.queued = 0;
        let swept = queued_ids.len();
        self.stats
            .cancelled
            .fetch_add(swept as u64, Ordering::Relaxed);
        if swept > 0 {
            debug!(swept, "cancelled all queued orders");
        }
        swept
    }

    /// Drain one rate-budget's worth of orders into the sink
    ///
    /// Pops up to the window's available slots in priority order, marks
    /// them processing, consumes the slots up front, then submits them
    /// concurrently. Timeouts and venue rejections resolve the order as
    /// rejected; the consumed slots stay consumed either way.
    #[instrument(skip(self, sink), fields(processed = tracing::field::Empty))]
    pub async fn process_tick(&self, sink: &dyn OrderSink) -> usize {
        let batch: Vec<QueuedOrder> = {
            let mut inner = self.inner.lock();
            inner.window.roll(Instant::now());
            let available = inner.window.available() as usize;
            let mut batch = Vec::new();
            while batch.len() < available {
                let Some(entry) = inner.heap.pop() else {
                    break;
                };
                // Cancelled orders leave stale heap entries behind
                let Some(order) = inner.orders.get_mut(&entry.order_id) else {
                    continue;
                };
                order.status = OrderStatus::Processing;
                let order = order.clone();
                inner.queued -= 1;
                batch.push(order);
            }
            inner.window.consume(batch.len() as u32);
            batch
        };

        if batch.is_empty() {
            return 0;
        }

        let timeout = self.config.sink_timeout;
        let submissions = batch.into_iter().map(|order| async move {
            let result = tokio::time::timeout(timeout, sink.submit(&order)).await;
            (order, result)
        });
        let results = futures::future::join_all(submissions).await;

        let mut processed = 0;
        for (mut order, result) in results {
            self.inner.lock().orders.remove(&order.order_id);
            let outcome = match result {
                Ok(Ok(fill)) => {
                    order.status = OrderStatus::Filled;
                    self.stats.filled.fetch_add(1, Ordering::Relaxed);
                    ExecutionOutcome::Filled(fill)
                }
                Ok(Err(err)) => {
                    order.status = OrderStatus::Rejected;
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    debug!(order_id = %order.order_id, %err, "order rejected by sink");
                    ExecutionOutcome::Rejected {
                        reason: err.to_string(),
                    }
                }
                Err(_elapsed) => {
                    order.status = OrderStatus::Rejected;
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    self.stats.timed_out.fetch_add(1, Ordering::Relaxed);
                    let err = SinkError::Timeout {
                        limit_ms: timeout.as_millis() as u64,
                    };
                    warn!(order_id = %order.order_id, %err, "sink deadline elapsed");
                    ExecutionOutcome::Rejected {
                        reason: err.to_string(),
                    }
                }
            };
            processed += 1;
            // Receiver may be gone during shutdown; reports are best-effort
            let _ = self.report_tx.send(ExecutionReport { order, outcome });
        }

        self.stats
            .processed
            .fetch_add(processed as u64, Ordering::Relaxed);
        tracing::Span::current().record("processed", processed);
        processed
    }

    /// Orders currently queued (not processing, not terminal)
    pub fn queued_depth(&self) -> usize {
        self.inner.lock().queued
    }

    /// Status of a live order; terminal orders have left the book
    pub fn status(&self, order_id: Uuid) -> Option<OrderStatus> {
        self.inner.lock().orders.get(&order_id).map(|o| o.status)
    }

    /// Submissions counted against the current window, with the limit
    pub fn window_usage(&self) -> (u32, u32) {
        let inner = self.inner.lock();
        (inner.window.used(), self.config.limit_per_window)
    }

    /// Cumulative counters for run snapshots
    pub fn stats_snapshot(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            enqueued: self.stats.enqueued.load(Ordering::Relaxed),
            processed: self.stats.processed.load(Ordering::Relaxed),
            filled: self.stats.filled.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            timed_out: self.stats.timed_out.load(Ordering::Relaxed),
            cancelled: self.stats.cancelled.load(Ordering::Relaxed),
            queued_depth: self.queued_depth(),
        }
    }
}
