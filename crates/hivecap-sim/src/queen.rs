//! Queen controller - single owner of all colonies and the harvest pool
//!
//! The queen advances every colony, pools harvested profit, and spends the
//! pool on new colonies. Colonies live in a `BTreeMap`, so every scan runs
//! in colony-id order and donor selection is deterministic: when several
//! colonies are spawn-eligible at once, the lowest id donates.

use std::collections::BTreeMap;

use hivecap_common::{AgentId, ColonyId, HiveError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::colony::Colony;
use crate::sampler::ReturnSampler;
use crate::snapshot::{ColonySnapshot, HiveSnapshot};
use crate::SimParams;

/// Record of one colony spawn, append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// Value of the global step counter when the spawn occurred
    /// (the 0-based index of the step that produced it)
    pub step: u64,
    /// Identifier of the spawned colony
    pub new_colony_id: ColonyId,
    /// Capital debited from the harvest pool, always exactly the spawn cost
    pub spawn_capital: Decimal,
}

/// One agent's intention to trade, surfaced from a simulation step
///
/// The controller does not talk to any execution channel itself; the
/// caller maps these into admission-queue orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDecision {
    /// Colony the deciding agent belongs to
    pub colony_id: ColonyId,
    /// Generation of that colony
    pub generation: u32,
    /// The deciding agent
    pub agent_id: AgentId,
    /// Sampled return fraction behind the decision
    pub return_fraction: Decimal,
    /// Equity committed to the trade
    pub stake: Decimal,
    /// Simulated pnl already applied to the agent
    pub pnl: Decimal,
}

/// Top-level owner of the colony population
#[derive(Debug)]
pub struct QueenController {
    params: SimParams,
    sampler: ReturnSampler,
    /// All colonies, keyed and iterated in id order
    pub colonies: BTreeMap<ColonyId, Colony>,
    /// Harvested capital not yet spent on spawns
    pub harvest_pool: Decimal,
    /// Deepest generation ever spawned
    pub max_generation_seen: u32,
    /// Append-only spawn log
    pub split_events: Vec<SplitEvent>,
    /// Completed steps
    pub global_step: u64,
    next_colony_id: u32,
}

impl QueenController {
    /// Construct a run with a single root colony
    ///
    /// Validates the parameters; invalid ones are fatal configuration
    /// errors.
    pub fn new(params: SimParams, sampler: ReturnSampler) -> Result<Self> {
        params.validate()?;

        let root_id = ColonyId(0);
        let root = Colony::found(root_id, 0, &params)?;
        let mut colonies = BTreeMap::new();
        colonies.insert(root_id, root);

        info!(
            agents_per_colony = params.agents_per_colony,
            start_equity = %params.start_equity_per_agent,
            target_equity = %params.target_equity_per_agent,
            "founded root colony"
        );

        Ok(Self {
            params,
            sampler,
            colonies,
            harvest_pool: Decimal::ZERO,
            max_generation_seen: 0,
            split_events: Vec::new(),
            global_step: 0,
            next_colony_id: 1,
        })
    }

    /// Run parameters fixed at construction
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Advance the whole population one discrete step
    ///
    /// Order within a step: trade, then harvest, then spawn, then advance
    /// the step counter. Returns the trade decisions agents produced, for
    /// the caller to submit as order intents.
    pub fn step(&mut self) -> Result<Vec<TradeDecision>> {
        let mut decisions = Vec::new();

        // 1. Trade
        for colony in self.colonies.values_mut() {
            let generation = colony.generation;
            let colony_id = colony.id;
            for trade in colony.step(&mut self.sampler, &self.params) {
                decisions.push(TradeDecision {
                    colony_id,
                    generation,
                    agent_id: trade.agent_id,
                    return_fraction: trade.record.return_fraction,
                    stake: trade.record.stake,
                    pnl: trade.record.pnl,
                });
            }
        }

        // 2. Harvest colonies that outgrew the trigger. Harvesting pulls
        // the multiplier back under the trigger, so this fires on the
        // crossing, not on every subsequent step.
        for colony in self.colonies.values_mut() {
            if colony.profit_multiplier() >= self.params.harvest_trigger_multiplier {
                let harvested = colony.harvest(self.params.harvest_rate)?;
                if harvested > Decimal::ZERO {
                    self.harvest_pool += harvested;
                    info!(
                        colony = %colony.id,
                        %harvested,
                        pool = %self.harvest_pool,
                        "harvested colony profit"
                    );
                }
            }
        }

        // 3. Spawn while the pool can afford it and a donor exists
        self.spawn_from_pool()?;

        // 4. Advance
        self.global_step += 1;
        debug!(
            step = self.global_step,
            colonies = self.colonies.len(),
            decisions = decisions.len(),
            pool = %self.harvest_pool,
            "simulation step complete"
        );

        Ok(decisions)
    }

    /// Spend the harvest pool on new colonies, one spawn cost at a time
    ///
    /// A donor must hold the eligibility multiplier and have headroom
    /// under the generation cap. With capital but no donor, the pool sits
    /// idle rather than over-spawning.
    fn spawn_from_pool(&mut self) -> Result<()> {
        let spawn_cost = self.params.spawn_cost();

        while self.harvest_pool >= spawn_cost {
            let donor = self
                .colonies
                .values()
                .find(|c| {
                    c.profit_multiplier() >= self.params.spawn_eligibility_multiplier
                        && c.generation < self.params.max_generation
                })
                .map(|c| (c.id, c.generation));

            let Some((donor_id, donor_generation)) = donor else {
                break;
            };

            let new_id = ColonyId(self.next_colony_id);
            self.next_colony_id += 1;
            let generation = donor_generation + 1;

            let colony = Colony::found(new_id, generation, &self.params)?;
            self.colonies.insert(new_id, colony);
            self.harvest_pool -= spawn_cost;
            self.max_generation_seen = self.max_generation_seen.max(generation);
            self.split_events.push(SplitEvent {
                step: self.global_step,
                new_colony_id: new_id,
                spawn_capital: spawn_cost,
            });

            info!(
                new_colony = %new_id,
                donor = %donor_id,
                generation,
                %spawn_cost,
                pool = %self.harvest_pool,
                "spawned colony from harvest pool"
            );
        }

        Ok(())
    }

    /// Route one execution result back to the deciding agent
    ///
    /// Venue feedback has no economic effect; it only moves the agent's
    /// fill/reject counters. Unknown origins are logged and dropped.
    pub fn apply_execution(&mut self, colony_id: ColonyId, agent_id: AgentId, filled: bool) {
        let Some(agent) = self
            .colonies
            .get_mut(&colony_id)
            .and_then(|c| c.agent_mut(agent_id))
        else {
            warn!(%colony_id, %agent_id, "execution report for unknown agent");
            return;
        };
        if filled {
            agent.record_fill();
        } else {
            agent.record_reject();
        }
    }

    /// Point-in-time view of the whole population
    ///
    /// A pure read: two snapshots with no step in between are identical.
    pub fn snapshot(&self) -> HiveSnapshot {
        let colonies: Vec<ColonySnapshot> = self
            .colonies
            .values()
            .map(|c| ColonySnapshot {
                id: c.id,
                generation: c.generation,
                agent_count: c.agents.len(),
                equity: c.total_equity(),
                harvested_capital: c.harvested_total,
                successful_agent_count: c.successful_agent_count(),
                stage: c.stage(self.params.split_fraction),
                profit_multiplier: c.profit_multiplier(),
            })
            .collect();

        HiveSnapshot {
            step: self.global_step,
            total_colonies: colonies.len(),
            total_agents: colonies.iter().map(|c| c.agent_count).sum(),
            total_equity: colonies.iter().map(|c| c.equity).sum(),
            total_harvested: colonies.iter().map(|c| c.harvested_capital).sum(),
            harvest_pool: self.harvest_pool,
            max_generation: self.max_generation_seen,
            colonies,
            split_events: self.split_events.clone(),
        }
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
            target_equity_per_agent: dec!(10000),
            ..SimParams::default()
        }
    }

    fn queen_with(values: Vec<Decimal>) -> QueenController {
        let sampler = ReturnSampler::from_history(values, Some(0)).unwrap();
        QueenController::new(small_params(), sampler).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let sampler = ReturnSampler::with_default_history(Some(0));
        let params = SimParams {
            agents_per_colony: 0,
            ..SimParams::default()
        };
        assert!(matches!(
            QueenController::new(params, sampler),
            Err(HiveError::Config(_))
        ));
    }

    #[test]
    fn test_step_surfaces_trade_decisions() {
        let mut queen = queen_with(vec![dec!(0.05)]);
        let decisions = queen.step().unwrap();
        assert_eq!(decisions.len(), 4);
        assert_eq!(queen.global_step, 1);
        for decision in &decisions {
            assert_eq!(decision.colony_id, ColonyId(0));
            assert_eq!(decision.return_fraction, dec!(0.05));
        }
    }

    #[test]
    fn test_harvest_fires_at_trigger_and_fills_pool() {
        let mut queen = queen_with(vec![dec!(0.0)]);

        // Push the root colony to exactly 2.0x: 4 agents × 100 profit
        let colony = queen.colonies.get_mut(&ColonyId(0)).unwrap();
        for agent in &mut colony.agents {
            agent.account.apply_pnl(dec!(100));
        }
        assert_eq!(colony.profit_multiplier(), dec!(2.0));

        queen.step().unwrap();

        // 10% of 400 profit pooled, 10 debited per agent
        assert_eq!(queen.harvest_pool, dec!(40.0));
        let colony = &queen.colonies[&ColonyId(0)];
        for agent in &colony.agents {
            assert_eq!(agent.equity(), dec!(190.0));
        }
    }

    #[test]
    fn test_below_trigger_no_harvest() {
        let mut queen = queen_with(vec![dec!(0.0)]);
        let colony = queen.colonies.get_mut(&ColonyId(0)).unwrap();
        for agent in &mut colony.agents {
            agent.account.apply_pnl(dec!(90));
        }

        queen.step().unwrap();
        assert_eq!(queen.harvest_pool, Decimal::ZERO);
    }

    #[test]
    fn test_pool_below_spawn_cost_spawns_nothing() {
        let mut queen = queen_with(vec![dec!(0.0)]);
        queen.harvest_pool = queen.params().spawn_cost() - dec!(0.01);

        // Make the root eligible to donate
        let colony = queen.colonies.get_mut(&ColonyId(0)).unwrap();
        for agent in &mut colony.agents {
            agent.account.apply_pnl(dec!(60));
        }

        queen.step().unwrap();
        assert_eq!(queen.colonies.len(), 1);
        assert!(queen.split_events.is_empty());
    }

    #[test]
    fn test_spawn_debits_exact_cost_and_logs_event() {
        let mut queen = queen_with(vec![dec!(0.0)]);
        let spawn_cost = queen.params().spawn_cost();
        queen.harvest_pool = spawn_cost;

        let colony = queen.colonies.get_mut(&ColonyId(0)).unwrap();
        for agent in &mut colony.agents {
            agent.account.apply_pnl(dec!(60));
        }

        queen.step().unwrap();

        assert_eq!(queen.colonies.len(), 2);
        assert_eq!(queen.harvest_pool, Decimal::ZERO);
        assert_eq!(queen.max_generation_seen, 1);
        assert_eq!(
            queen.split_events,
            vec![SplitEvent {
                step: 0,
                new_colony_id: ColonyId(1),
                spawn_capital: spawn_cost,
            }]
        );
        assert_eq!(queen.colonies[&ColonyId(1)].generation, 1);
    }

    #[test]
    fn test_capital_without_donor_sits_idle() {
        let mut queen = queen_with(vec![dec!(0.0)]);
        queen.harvest_pool = queen.params().spawn_cost() * dec!(3);

        // No colony holds the eligibility multiplier
        queen.step().unwrap();
        assert_eq!(queen.colonies.len(), 1);
        assert_eq!(queen.harvest_pool, queen.params().spawn_cost() * dec!(3));
    }

    #[test]
    fn test_generation_cap_blocks_spawning() {
        let params = SimParams {
            max_generation: 0,
            ..small_params()
        };
        let sampler = ReturnSampler::from_history(vec![dec!(0.0)], Some(0)).unwrap();
        let mut queen = QueenController::new(params, sampler).unwrap();
        queen.harvest_pool = queen.params().spawn_cost();

        let colony = queen.colonies.get_mut(&ColonyId(0)).unwrap();
        for agent in &mut colony.agents {
            agent.account.apply_pnl(dec!(60));
        }

        queen.step().unwrap();
        assert_eq!(queen.colonies.len(), 1);
        assert_eq!(queen.harvest_pool, queen.params().spawn_cost());
    }

    #[test]
    fn test_donor_tie_break_is_lowest_colony_id() {
        let mut queen = queen_with(vec![dec!(0.0)]);
        queen.harvest_pool = queen.params().spawn_cost();

        // Spawn a second colony manually, then make both eligible
        let params = queen.params().clone();
        let second = Colony::found(ColonyId(1), 3, &params).unwrap();
        queen.colonies.insert(ColonyId(1), second);
        queen.next_colony_id = 2;
        for colony in queen.colonies.values_mut() {
            for agent in &mut colony.agents {
                agent.account.apply_pnl(dec!(60));
            }
        }

        queen.step().unwrap();

        // Donor was colony 0 (generation 0), so the child is generation 1
        assert_eq!(queen.colonies[&ColonyId(2)].generation, 1);
    }

    #[test]
    fn test_snapshot_is_idempotent_between_steps() {
        let mut queen = queen_with(vec![dec!(0.01), dec!(-0.02), dec!(0.03)]);
        queen.step().unwrap();

        let a = queen.snapshot();
        let b = queen.snapshot();
        assert_eq!(a, b);

        queen.step().unwrap();
        assert_ne!(a, queen.snapshot());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let build = || {
            let sampler =
                ReturnSampler::from_history(vec![dec!(0.02), dec!(-0.01), dec!(0.04)], Some(99))
                    .unwrap();
            QueenController::new(small_params(), sampler).unwrap()
        };
        let mut a = build();
        let mut b = build();
        for _ in 0..20 {
            a.step().unwrap();
            b.step().unwrap();
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_apply_execution_moves_counters_only() {
        let mut queen = queen_with(vec![dec!(0.05)]);
        let before = queen.colonies[&ColonyId(0)].total_equity();

        queen.apply_execution(ColonyId(0), AgentId(2), true);
        queen.apply_execution(ColonyId(0), AgentId(2), false);
        queen.apply_execution(ColonyId(9), AgentId(0), true); // unknown, dropped

        let colony = &queen.colonies[&ColonyId(0)];
        assert_eq!(colony.agents[2].fill_count, 1);
        assert_eq!(colony.agents[2].reject_count, 1);
        assert_eq!(colony.total_equity(), before);
    }
}
