//! Point-in-time views of the simulation
//!
//! Snapshots are pure values derived from controller state. Wall-clock
//! timestamps are deliberately absent here: the runtime attaches one when a
//! snapshot is persisted, so reading the same state twice yields equal
//! snapshots.

use hivecap_common::ColonyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::colony::ColonyStage;
use crate::queen::SplitEvent;

/// One colony's row in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonySnapshot {
    pub id: ColonyId,
    pub generation: u32,
    pub agent_count: usize,
    pub equity: Decimal,
    pub harvested_capital: Decimal,
    pub successful_agent_count: usize,
    pub stage: ColonyStage,
    pub profit_multiplier: Decimal,
}

/// Aggregate view of the whole population at a step boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveSnapshot {
    /// Completed steps
    pub step: u64,
    pub total_colonies: usize,
    pub total_agents: usize,
    pub total_equity: Decimal,
    /// Cumulative capital harvested across all colonies
    pub total_harvested: Decimal,
    /// Harvested capital not yet spent on spawns
    pub harvest_pool: Decimal,
    /// Deepest generation spawned so far
    pub max_generation: u32,
    pub colonies: Vec<ColonySnapshot>,
    pub split_events: Vec<SplitEvent>,
}
