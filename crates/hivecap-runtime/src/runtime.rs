//! Run control: the two cooperative schedulers
//!
//! One `select!` loop owns both cadences. The simulation arm applies any
//! pending execution reports, steps the queen, and enqueues the new trade
//! intents; the drain arm forwards admitted orders to the sink within the
//! rate budget. Because both arms run on the same loop, nothing ever
//! mutates agent state concurrently with a step.

use std::sync::Arc;
use std::time::Duration;

use hivecap_common::{QueueError, Result};
use hivecap_oms::{
    AdmissionQueue, ExecutionReport, OrderIntent, OrderOrigin, OrderSink, Side,
};
use hivecap_sim::{QueenController, ReturnSampler, TradeDecision};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::config::RunConfig;
use crate::persist::{write_snapshot_best_effort, SnapshotRecord};

/// Priority stamped on root-colony orders; each generation down ranks one
/// lower, so older lineages drain first when the window is scarce
const PRIORITY_BASE: u8 = 100;

/// Result of one on-demand simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Completed steps after this one
    pub step: u64,
    /// Trade decisions the population produced
    pub decisions: usize,
    /// Intents actually admitted (the rest hit a full queue)
    pub enqueued: usize,
}

/// Cloneable handle that stops a running simulation
#[derive(Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    /// Request the run to stop at the next scheduler turn
    pub fn stop(&self) {
        let _ = self.0.send(true);
    }
}

/// Owner of one simulation run
pub struct HiveRuntime {
    config: RunConfig,
    queen: Mutex<QueenController>,
    queue: AdmissionQueue,
    sink: Arc<dyn OrderSink>,
    reports: Mutex<mpsc::UnboundedReceiver<ExecutionReport>>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl HiveRuntime {
    /// Build a run from validated configuration
    ///
    /// Loads the return history (file or bundled), founds the root colony,
    /// and wires the admission queue's report channel back to the
    /// simulation side.
    pub fn new(config: RunConfig, sink: Arc<dyn OrderSink>) -> Result<Self> {
        config.validate()?;

        let sampler = match &config.returns_path {
            Some(path) => ReturnSampler::from_csv_path(path, config.rng_seed)?,
            None => ReturnSampler::with_default_history(config.rng_seed),
        };
        let queen = QueenController::new(config.sim.clone(), sampler)?;
        let (queue, reports) = AdmissionQueue::new(config.admission());
        let (stop_tx, stop_rx) = watch::channel(false);

        Ok(Self {
            config,
            queen: Mutex::new(queen),
            queue,
            sink,
            reports: Mutex::new(reports),
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        })
    }

    /// Handle for stopping the run from elsewhere
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_tx.clone())
    }

    /// Point-in-time snapshot of population and order counters
    pub fn snapshot_record(&self) -> SnapshotRecord {
        SnapshotRecord::capture(self.queen.lock().snapshot(), self.queue.stats_snapshot())
    }

    /// Advance the simulation one step, on demand
    ///
    /// Applies pending execution reports first, so fill application is
    /// always serialized with stepping, then routes every new trade
    /// decision into the admission queue. A full queue drops the intent
    /// with a warning; the decision's simulated economics already
    /// happened, so nothing else is lost.
    pub fn step_once(&self) -> Result<StepOutcome> {
        self.apply_pending_reports();

        let (decisions, step) = {
            let mut queen = self.queen.lock();
            let decisions = queen.step()?;
            (decisions, queen.global_step)
        };

        let total = decisions.len();
        let mut enqueued = 0;
        for decision in decisions {
            let intent = self.intent_for(&decision);
            match self.queue.enqueue(intent) {
                Ok(_) => enqueued += 1,
                Err(err @ QueueError::Full { .. }) => {
                    warn!(%err, colony = %decision.colony_id, "order intent dropped");
                }
                Err(err) => {
                    warn!(%err, "unexpected admission failure");
                }
            }
        }

        debug!(step, decisions = total, enqueued, "simulation tick");
        Ok(StepOutcome {
            step,
            decisions: total,
            enqueued,
        })
    }

    /// Drain one rate-budget's worth of orders into the sink
    pub async fn drain_once(&self) -> usize {
        self.queue.process_tick(self.sink.as_ref()).await
    }

    /// Drive the run to `max_steps` or an external stop
    ///
    /// On the way out: queued orders are cancelled (processing ones have
    /// already resolved inside their drain tick), remaining reports are
    /// applied, and the final snapshot is persisted best-effort.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SnapshotRecord> {
        let mut sim_timer =
            tokio::time::interval(Duration::from_millis(self.config.step_interval_ms));
        let mut drain_timer =
            tokio::time::interval(Duration::from_millis(self.config.drain_interval_ms));
        let mut stop_rx = self.stop_rx.clone();

        info!(
            max_steps = self.config.max_steps,
            step_interval_ms = self.config.step_interval_ms,
            drain_interval_ms = self.config.drain_interval_ms,
            "run started"
        );

        loop {
            tokio::select! {
                _ = sim_timer.tick() => {
                    let outcome = self.step_once()?;
                    if self.config.log_interval > 0
                        && outcome.step % self.config.log_interval == 0
                    {
                        write_snapshot_best_effort(
                            &self.config.snapshot_path,
                            &self.snapshot_record(),
                        );
                    }
                    if outcome.step >= self.config.max_steps {
                        info!(step = outcome.step, "max steps reached");
                        break;
                    }
                }
                _ = drain_timer.tick() => {
                    self.drain_once().await;
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        info!("stop requested");
                        break;
                    }
                }
            }
        }

        let swept = self.queue.cancel_all_queued();
        if swept > 0 {
            info!(swept, "cancelled queued orders on shutdown");
        }
        self.apply_pending_reports();

        let record = self.snapshot_record();
        write_snapshot_best_effort(&self.config.snapshot_path, &record);
        info!(
            step = record.snapshot.step,
            colonies = record.snapshot.total_colonies,
            total_equity = %record.snapshot.total_equity,
            filled = record.orders.filled,
            rejected = record.orders.rejected,
            "run finished"
        );
        Ok(record)
    }

    /// Apply every execution report currently waiting on the channel
    fn apply_pending_reports(&self) {
        let mut reports = self.reports.lock();
        let mut queen = self.queen.lock();
        while let Ok(report) = reports.try_recv() {
            queen.apply_execution(
                report.order.origin.colony_id,
                report.order.origin.agent_id,
                report.is_fill(),
            );
        }
    }

    /// Map a trade decision onto an order intent
    ///
    /// Side follows the sign of the sampled return, quantity is the stake
    /// at the reference price, and priority descends with generation.
    fn intent_for(&self, decision: &TradeDecision) -> OrderIntent {
        let side = if decision.return_fraction >= Decimal::ZERO {
            Side::Buy
        } else {
            Side::Sell
        };
        let quantity = (decision.stake / self.config.reference_price).round_dp(8);
        let priority = PRIORITY_BASE
            .saturating_sub(u8::try_from(decision.generation).unwrap_or(u8::MAX));

        OrderIntent {
            origin: OrderOrigin {
                colony_id: decision.colony_id,
                agent_id: decision.agent_id,
            },
            symbol: self.config.symbol.clone(),
            side,
            quantity,
            price: self.config.reference_price,
            priority,
        }
    }
}
