//! Run configuration
//!
//! Compiled defaults overridable through `HIVECAP_`-prefixed environment
//! variables (a `.env` file is honored). Unparseable or out-of-range
//! values are configuration errors and fatal at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use hivecap_common::{HiveError, Result};
use hivecap_oms::AdmissionConfig;
use hivecap_sim::SimParams;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Full configuration of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Population policy parameters
    pub sim: SimParams,
    /// Steps to run before a batch run exits
    pub max_steps: u64,
    /// Simulation scheduler period
    pub step_interval_ms: u64,
    /// Drain scheduler period (deliberately much shorter)
    pub drain_interval_ms: u64,
    /// Maximum queued orders before admission rejects
    pub queue_max_depth: usize,
    /// Venue submissions allowed per rate window
    pub limit_per_window: u32,
    /// Rate window length
    pub rate_window_ms: u64,
    /// Deadline on each venue submission
    pub sink_timeout_ms: u64,
    /// Traded symbol stamped on order intents
    pub symbol: String,
    /// Reference price used to size order quantities
    pub reference_price: Decimal,
    /// Venue minimum notional for the paper sink
    pub min_notional: Decimal,
    /// Persist a snapshot every this many steps (0 disables interim writes)
    pub log_interval: u64,
    /// Where run snapshots are written
    pub snapshot_path: PathBuf,
    /// Optional CSV of historical returns replacing the bundled set
    pub returns_path: Option<PathBuf>,
    /// Optional sampler seed for reproducible runs
    pub rng_seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sim: SimParams::default(),
            max_steps: 1000,
            step_interval_ms: 2000,
            drain_interval_ms: 100,
            queue_max_depth: 10_000,
            limit_per_window: 100,
            rate_window_ms: 1000,
            sink_timeout_ms: 5000,
            symbol: "BTC-GBP".to_string(),
            reference_price: dec!(40000),
            min_notional: dec!(1),
            log_interval: 50,
            snapshot_path: PathBuf::from("hivecap_snapshot.json"),
            returns_path: None,
            rng_seed: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from the environment over the defaults
    pub fn load() -> Result<Self> {
        // Pick up a .env file when present
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Some(v) = env_parse("HIVECAP_AGENTS_PER_COLONY")? {
            cfg.sim.agents_per_colony = v;
        }
        if let Some(v) = env_parse("HIVECAP_START_EQUITY")? {
            cfg.sim.start_equity_per_agent = v;
        }
        if let Some(v) = env_parse("HIVECAP_TARGET_EQUITY")? {
            cfg.sim.target_equity_per_agent = v;
        }
        if let Some(v) = env_parse("HIVECAP_HARVEST_RATE")? {
            cfg.sim.harvest_rate = v;
        }
        if let Some(v) = env_parse("HIVECAP_SPLIT_FRACTION")? {
            cfg.sim.split_fraction = v;
        }
        if let Some(v) = env_parse("HIVECAP_HARVEST_TRIGGER")? {
            cfg.sim.harvest_trigger_multiplier = v;
        }
        if let Some(v) = env_parse("HIVECAP_SPAWN_ELIGIBILITY")? {
            cfg.sim.spawn_eligibility_multiplier = v;
        }
        if let Some(v) = env_parse("HIVECAP_MAX_GENERATION")? {
            cfg.sim.max_generation = v;
        }
        if let Some(v) = env_parse("HIVECAP_MAX_STEPS")? {
            cfg.max_steps = v;
        }
        if let Some(v) = env_parse("HIVECAP_STEP_INTERVAL_MS")? {
            cfg.step_interval_ms = v;
        }
        if let Some(v) = env_parse("HIVECAP_DRAIN_INTERVAL_MS")? {
            cfg.drain_interval_ms = v;
        }
        if let Some(v) = env_parse("HIVECAP_QUEUE_MAX_DEPTH")? {
            cfg.queue_max_depth = v;
        }
        if let Some(v) = env_parse("HIVECAP_RATE_LIMIT_PER_WINDOW")? {
            cfg.limit_per_window = v;
        }
        if let Some(v) = env_parse("HIVECAP_RATE_WINDOW_MS")? {
            cfg.rate_window_ms = v;
        }
        if let Some(v) = env_parse("HIVECAP_SINK_TIMEOUT_MS")? {
            cfg.sink_timeout_ms = v;
        }
        if let Ok(v) = std::env::var("HIVECAP_SYMBOL") {
            cfg.symbol = v;
        }
        if let Some(v) = env_parse("HIVECAP_REFERENCE_PRICE")? {
            cfg.reference_price = v;
        }
        if let Some(v) = env_parse("HIVECAP_MIN_NOTIONAL")? {
            cfg.min_notional = v;
        }
        if let Some(v) = env_parse("HIVECAP_LOG_INTERVAL")? {
            cfg.log_interval = v;
        }
        if let Ok(v) = std::env::var("HIVECAP_SNAPSHOT_PATH") {
            cfg.snapshot_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HIVECAP_RETURNS_PATH") {
            cfg.returns_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_parse("HIVECAP_RNG_SEED")? {
            cfg.rng_seed = Some(v);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the full configuration, failing with a configuration error
    pub fn validate(&self) -> Result<()> {
        self.sim.validate()?;
        if self.step_interval_ms == 0 {
            return Err(HiveError::Config("step_interval_ms must be positive".into()));
        }
        if self.drain_interval_ms == 0 {
            return Err(HiveError::Config(
                "drain_interval_ms must be positive".into(),
            ));
        }
        if self.queue_max_depth == 0 {
            return Err(HiveError::Config("queue_max_depth must be positive".into()));
        }
        if self.limit_per_window == 0 {
            return Err(HiveError::Config(
                "limit_per_window must be positive".into(),
            ));
        }
        if self.rate_window_ms == 0 {
            return Err(HiveError::Config("rate_window_ms must be positive".into()));
        }
        if self.sink_timeout_ms == 0 {
            return Err(HiveError::Config("sink_timeout_ms must be positive".into()));
        }
        if self.reference_price <= Decimal::ZERO {
            return Err(HiveError::Config("reference_price must be positive".into()));
        }
        if self.min_notional < Decimal::ZERO {
            return Err(HiveError::Config(
                "min_notional must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Admission queue configuration derived from the run parameters
    pub fn admission(&self) -> AdmissionConfig {
        AdmissionConfig {
            max_depth: self.queue_max_depth,
            limit_per_window: self.limit_per_window,
            window_duration: Duration::from_millis(self.rate_window_ms),
            sink_timeout: Duration::from_millis(self.sink_timeout_ms),
        }
    }
}

/// Read and parse one environment variable; unparseable values are fatal
fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => {
            let value = raw
                .parse::<T>()
                .map_err(|e| HiveError::Config(format!("bad {} value {:?}: {}", key, raw, e)))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
