//! # Hivecap Sim
//!
//! Hierarchical capital simulation for the Hivecap engine.
//!
//! ## Population Model
//!
//! ```text
//! QueenController ──owns──► Colony ──owns──► Agent ──owns──► EquityAccount
//!        │                     │
//!        │ harvest pool        │ profit-only harvest
//!        └──── spawns new ◄────┘ (trigger: profit multiplier)
//! ```
//!
//! Agents trade against a fixed historical return distribution, colonies
//! aggregate them and surrender a slice of profit when they outgrow a
//! threshold, and the queen pools those harvests to fund new colonies.
//! Everything in this crate is synchronous and deterministic for a fixed
//! sampler seed; scheduling and order flow live elsewhere.

pub mod agent;
pub mod colony;
pub mod queen;
pub mod sampler;
pub mod snapshot;

pub use agent::{Agent, TradeOutcome, TradeRecord};
pub use colony::{AgentTrade, Colony, ColonyStage};
pub use queen::{QueenController, SplitEvent, TradeDecision};
pub use sampler::ReturnSampler;
pub use snapshot::{ColonySnapshot, HiveSnapshot};

use hivecap_common::{HiveError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Simulation policy parameters
///
/// One instance is fixed for the lifetime of a run. `validate` is called by
/// the queen controller at construction; invalid parameters are fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Agents created per colony
    pub agents_per_colony: u32,
    /// Starting equity per agent
    pub start_equity_per_agent: Decimal,
    /// Equity at which an agent counts as successful and stops trading
    pub target_equity_per_agent: Decimal,
    /// Fraction of colony profit removed per harvest
    pub harvest_rate: Decimal,
    /// Fraction of successful agents at which a colony is ready to split
    pub split_fraction: Decimal,
    /// Profit multiplier at which the queen harvests a colony
    pub harvest_trigger_multiplier: Decimal,
    /// Profit multiplier a colony must hold to donate its generation to a spawn
    pub spawn_eligibility_multiplier: Decimal,
    /// Hard cap on colony generation depth
    pub max_generation: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            agents_per_colony: hivecap_common::DEFAULT_AGENTS_PER_COLONY,
            start_equity_per_agent: dec!(100),
            target_equity_per_agent: dec!(1000000),
            harvest_rate: dec!(0.10),
            split_fraction: dec!(0.5),
            harvest_trigger_multiplier: dec!(2.0),
            spawn_eligibility_multiplier: dec!(1.5),
            max_generation: 5,
        }
    }
}

impl SimParams {
    /// Capital required to spawn one colony
    #[inline]
    pub fn spawn_cost(&self) -> Decimal {
        self.start_equity_per_agent * Decimal::from(self.agents_per_colony)
    }

    /// Check parameter sanity, failing with a configuration error
    pub fn validate(&self) -> Result<()> {
        if self.agents_per_colony == 0 {
            return Err(HiveError::Config("agents_per_colony must be positive".into()));
        }
        if self.start_equity_per_agent <= Decimal::ZERO {
            return Err(HiveError::Config(
                "start_equity_per_agent must be positive".into(),
            ));
        }
        if self.target_equity_per_agent <= self.start_equity_per_agent {
            return Err(HiveError::Config(
                "target_equity_per_agent must exceed start_equity_per_agent".into(),
            ));
        }
        if self.harvest_rate <= Decimal::ZERO || self.harvest_rate > Decimal::ONE {
            return Err(HiveError::Config("harvest_rate must be within (0, 1]".into()));
        }
        if self.split_fraction <= Decimal::ZERO || self.split_fraction > Decimal::ONE {
            return Err(HiveError::Config("split_fraction must be within (0, 1]".into()));
        }
        if self.harvest_trigger_multiplier <= Decimal::ONE {
            return Err(HiveError::Config(
                "harvest_trigger_multiplier must exceed 1.0".into(),
            ));
        }
        if self.spawn_eligibility_multiplier <= Decimal::ONE {
            return Err(HiveError::Config(
                "spawn_eligibility_multiplier must exceed 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(SimParams::default().validate().is_ok());
    }

    #[test]
    fn test_spawn_cost() {
        let params = SimParams::default();
        assert_eq!(params.spawn_cost(), dec!(10000));
    }

    #[test]
    fn test_validate_rejects_zero_agents() {
        let params = SimParams {
            agents_per_colony: 0,
            ..SimParams::default()
        };
        assert!(matches!(params.validate(), Err(HiveError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_target_below_start() {
        let params = SimParams {
            target_equity_per_agent: dec!(50),
            ..SimParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_harvest_rate() {
        let params = SimParams {
            harvest_rate: dec!(1.5),
            ..SimParams::default()
        };
        assert!(params.validate().is_err());
    }
}
