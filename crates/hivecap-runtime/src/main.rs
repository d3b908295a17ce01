//! Hivecap batch binary
//!
//! Runs the capital simulation to `max_steps` (or ctrl-c), emits the final
//! snapshot, and exits 0. All parameters come from the environment; see
//! [`hivecap_runtime::RunConfig`].

use std::sync::Arc;

use anyhow::Result;
use hivecap_oms::PaperSink;
use hivecap_runtime::{HiveRuntime, RunConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting Hivecap v{}", hivecap_common::VERSION);

    // Load configuration; invalid parameters are fatal here and only here
    let config = RunConfig::load()?;
    info!(
        agents_per_colony = config.sim.agents_per_colony,
        start_equity = %config.sim.start_equity_per_agent,
        target_equity = %config.sim.target_equity_per_agent,
        max_steps = config.max_steps,
        symbol = %config.symbol,
        "Loaded configuration"
    );

    let sink = Arc::new(PaperSink::new(config.min_notional));
    let runtime = HiveRuntime::new(config, sink)?;

    // Ctrl-c stops the run; queued orders are swept on the way out
    let stop = runtime.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            stop.stop();
        }
    });

    let record = runtime.run().await?;
    info!(
        steps = record.snapshot.step,
        colonies = record.snapshot.total_colonies,
        agents = record.snapshot.total_agents,
        total_equity = %record.snapshot.total_equity,
        total_harvested = %record.snapshot.total_harvested,
        generation = record.snapshot.max_generation,
        orders_filled = record.orders.filled,
        orders_rejected = record.orders.rejected,
        "Run complete"
    );

    Ok(())
}
