//! Colony - a fixed-size population of agents managed as a unit
//!
//! The colony steps its agents, aggregates their equity, and surrenders a
//! profit-only harvest when asked. Lifecycle stage is derived from the
//! numbers on demand, never stored, so the label can't drift from the
//! underlying state.

use hivecap_common::{AccountError, AgentId, ColonyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, TradeOutcome, TradeRecord};
use crate::sampler::ReturnSampler;
use crate::SimParams;

/// Derived lifecycle stage of a colony
///
/// Informational only: harvest and spawn policy key off the profit
/// multiplier and the successful-agent count directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColonyStage {
    /// Below the split threshold
    Growing,
    /// Enough successful agents to fund a split
    ReadyToSplit,
    /// Every agent has reached the target at least once
    Mature,
}

/// One agent's trade from a colony step, annotated with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTrade {
    /// Agent ordinal within the colony
    pub agent_id: AgentId,
    /// The realized trade
    pub record: TradeRecord,
    /// Agent equity after the trade was applied
    pub equity_after: Decimal,
}

/// A fixed-size population of agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colony {
    /// Colony identifier, assigned in spawn order
    pub id: ColonyId,
    /// 0 for the root colony, parent generation + 1 for spawned ones
    pub generation: u32,
    /// Fixed-size ordered population
    pub agents: Vec<Agent>,
    /// Capital surrendered to the queen so far
    pub harvested_total: Decimal,
    /// Steps survived
    pub age_in_steps: u64,
}

impl Colony {
    /// Found a colony with a fresh population
    pub fn found(
        id: ColonyId,
        generation: u32,
        params: &SimParams,
    ) -> Result<Self, AccountError> {
        let agents = (0..params.agents_per_colony)
            .map(|ordinal| Agent::new(AgentId(ordinal), params.start_equity_per_agent))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            generation,
            agents,
            harvested_total: Decimal::ZERO,
            age_in_steps: 0,
        })
    }

    /// Step every active agent once, collecting the realized trades
    pub fn step(&mut self, sampler: &mut ReturnSampler, params: &SimParams) -> Vec<AgentTrade> {
        let mut trades = Vec::new();
        for agent in &mut self.agents {
            if let TradeOutcome::Traded(record) =
                agent.step(sampler, params.target_equity_per_agent)
            {
                trades.push(AgentTrade {
                    agent_id: agent.id,
                    equity_after: agent.equity(),
                    record,
                });
            }
        }
        self.age_in_steps += 1;
        trades
    }

    /// Sum of agent equities
    pub fn total_equity(&self) -> Decimal {
        self.agents.iter().map(Agent::equity).sum()
    }

    /// Sum of agent starting principals
    pub fn start_total(&self) -> Decimal {
        self.agents.iter().map(|a| a.account.start()).sum()
    }

    /// Total equity over starting capital
    pub fn profit_multiplier(&self) -> Decimal {
        let start_total = self.start_total();
        if start_total.is_zero() {
            return Decimal::ZERO;
        }
        self.total_equity() / start_total
    }

    /// Agents that have reached the target at least once
    pub fn successful_agent_count(&self) -> usize {
        self.agents.iter().filter(|a| a.hit_target).count()
    }

    /// Whether enough agents have succeeded to fund a split
    pub fn can_split(&self, split_fraction: Decimal) -> bool {
        Decimal::from(self.successful_agent_count())
            >= Decimal::from(self.agents.len()) * split_fraction
    }

    /// Derive the lifecycle stage
    pub fn stage(&self, split_fraction: Decimal) -> ColonyStage {
        let successful = self.successful_agent_count();
        if successful == self.agents.len() {
            ColonyStage::Mature
        } else if self.can_split(split_fraction) {
            ColonyStage::ReadyToSplit
        } else {
            ColonyStage::Growing
        }
    }

    /// Harvest `rate` of each agent's positive profit into one sum
    ///
    /// Debits are strictly per-agent and profit-only, so no agent's
    /// principal is ever touched and loss-making agents are skipped. A
    /// colony whose aggregate profit is zero or negative is a no-op
    /// returning zero, not an error.
    pub fn harvest(&mut self, rate: Decimal) -> Result<Decimal, AccountError> {
        if self.total_profit() <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let mut harvested = Decimal::ZERO;
        for agent in &mut self.agents {
            harvested += agent.harvest(rate)?;
        }
        self.harvested_total += harvested;
        Ok(harvested)
    }

    /// Colony profit since founding: `max` of zero and equity over start
    pub fn total_profit(&self) -> Decimal {
        (self.total_equity() - self.start_total()).max(Decimal::ZERO)
    }

    /// Look up an agent by ordinal
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.0 as usize).filter(|a| a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn small_params() -> SimParams {
        SimParams {
            agents_per_colony: 4,
            start_equity_per_agent: dec!(100),
            target_equity_per_agent: dec!(1000),
            ..SimParams::default()
        }
    }

    fn fixed_sampler(values: Vec<Decimal>) -> ReturnSampler {
        ReturnSampler::from_history(values, Some(0)).unwrap()
    }

    #[test]
    fn test_found_creates_full_population() {
        let params = small_params();
        let colony = Colony::found(ColonyId(0), 0, &params).unwrap();
        assert_eq!(colony.agents.len(), 4);
        assert_eq!(colony.total_equity(), dec!(400));
        assert_eq!(colony.profit_multiplier(), Decimal::ONE);
        assert_eq!(colony.stage(dec!(0.5)), ColonyStage::Growing);
    }

    #[test]
    fn test_step_advances_all_active_agents() {
        let params = small_params();
        let mut colony = Colony::found(ColonyId(0), 0, &params).unwrap();
        let mut sampler = fixed_sampler(vec![dec!(0.05)]);

        let trades = colony.step(&mut sampler, &params);
        assert_eq!(trades.len(), 4);
        assert_eq!(colony.age_in_steps, 1);
        // stake 100 × 0.02, pnl 2 × 0.05 per agent
        assert_eq!(colony.total_equity(), dec!(400.4000));
    }

    #[test]
    fn test_harvest_debits_each_agent_proportionally() {
        let params = small_params();
        let mut colony = Colony::found(ColonyId(0), 0, &params).unwrap();

        colony.agents[0].account.apply_pnl(dec!(100));
        colony.agents[1].account.apply_pnl(dec!(40));
        // agents 2 and 3 stay at principal

        let harvested = colony.harvest(dec!(0.10)).unwrap();
        assert_eq!(harvested, dec!(14.0));
        assert_eq!(colony.harvested_total, dec!(14.0));
        assert_eq!(colony.agents[0].equity(), dec!(190.0));
        assert_eq!(colony.agents[1].equity(), dec!(136.0));
        assert_eq!(colony.agents[2].equity(), dec!(100));
    }

    #[test]
    fn test_harvest_skips_loss_making_agents() {
        let params = small_params();
        let mut colony = Colony::found(ColonyId(0), 0, &params).unwrap();

        colony.agents[0].account.apply_pnl(dec!(100));
        colony.agents[1].account.apply_pnl(dec!(-50));

        let harvested = colony.harvest(dec!(0.10)).unwrap();
        assert_eq!(harvested, dec!(10.0));
        // the losing agent is untouched
        assert_eq!(colony.agents[1].equity(), dec!(50));
    }

    #[test]
    fn test_harvest_without_profit_is_noop() {
        let params = small_params();
        let mut colony = Colony::found(ColonyId(0), 0, &params).unwrap();
        colony.agents[0].account.apply_pnl(dec!(-50));

        let harvested = colony.harvest(dec!(0.10)).unwrap();
        assert_eq!(harvested, Decimal::ZERO);
        assert_eq!(colony.harvested_total, Decimal::ZERO);
    }

    #[test]
    fn test_stage_transitions_with_successful_agents() {
        let params = small_params();
        let mut colony = Colony::found(ColonyId(0), 0, &params).unwrap();

        colony.agents[0].hit_target = true;
        assert_eq!(colony.stage(dec!(0.5)), ColonyStage::Growing);
        assert!(!colony.can_split(dec!(0.5)));

        colony.agents[1].hit_target = true;
        assert_eq!(colony.stage(dec!(0.5)), ColonyStage::ReadyToSplit);
        assert!(colony.can_split(dec!(0.5)));

        colony.agents[2].hit_target = true;
        colony.agents[3].hit_target = true;
        assert_eq!(colony.stage(dec!(0.5)), ColonyStage::Mature);
    }

    #[test]
    fn test_agent_lookup() {
        let params = small_params();
        let mut colony = Colony::found(ColonyId(0), 0, &params).unwrap();
        assert!(colony.agent_mut(AgentId(3)).is_some());
        assert!(colony.agent_mut(AgentId(4)).is_none());
    }
}
