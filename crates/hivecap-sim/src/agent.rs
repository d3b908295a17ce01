//! Agent - one simulated trader
//!
//! An agent owns an equity account and converts sampled returns into pnl.
//! Trade size cycles through a fixed prime scale sequence so position sizes
//! vary across agents and over time without the risk fraction ever growing
//! unboundedly; that dispersion is what makes the colony-level success-rate
//! statistic meaningful even though every agent shares one distribution.

use hivecap_common::{AccountError, AgentId, EquityAccount, SCALE_PRIMES};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sampler::ReturnSampler;

/// One realized simulated trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Signed pnl applied to the agent's account
    pub pnl: Decimal,
    /// The sampled return fraction behind the trade
    pub return_fraction: Decimal,
    /// Equity committed to the trade (balance × scale fraction)
    pub stake: Decimal,
}

/// Outcome of stepping an agent once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// The agent traded
    Traded(TradeRecord),
    /// Ruined or already at target; nothing happened
    Inactive,
}

/// One simulated trader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Ordinal within the owning colony
    pub id: AgentId,
    /// Capital account; the only path equity moves through
    pub account: EquityAccount,
    /// Trades taken so far
    pub trade_count: u64,
    /// Trades with a positive sampled return
    pub win_count: u64,
    /// Cursor into the prime scale sequence
    pub scale_index: usize,
    /// Latched true the first time equity reaches the target
    pub hit_target: bool,
    /// Venue fills reported back for this agent's orders
    pub fill_count: u64,
    /// Venue rejections (including timeouts) for this agent's orders
    pub reject_count: u64,
}

impl Agent {
    /// Create an agent with the given starting equity
    pub fn new(id: AgentId, start_equity: Decimal) -> Result<Self, AccountError> {
        Ok(Self {
            id,
            account: EquityAccount::open(start_equity)?,
            trade_count: 0,
            win_count: 0,
            scale_index: 0,
            hit_target: false,
            fill_count: 0,
            reject_count: 0,
        })
    }

    /// Current equity
    #[inline]
    pub fn equity(&self) -> Decimal {
        self.account.balance()
    }

    /// Profit since creation (may be negative)
    #[inline]
    pub fn profit_since_start(&self) -> Decimal {
        self.account.profit_since_start()
    }

    /// Whether the agent is permanently out of the game
    #[inline]
    pub fn is_ruined(&self) -> bool {
        self.account.is_ruined()
    }

    /// Whether the agent is active: not ruined and still below target
    pub fn is_active(&self, target: Decimal) -> bool {
        !self.is_ruined() && self.account.balance() < target
    }

    /// Advance the agent one step
    ///
    /// An inactive agent is a no-op. An active one stakes
    /// `balance × scale_fraction`, applies `stake × r` for a sampled `r`,
    /// and advances its counters and scale cursor.
    pub fn step(&mut self, sampler: &mut ReturnSampler, target: Decimal) -> TradeOutcome {
        if !self.is_active(target) {
            return TradeOutcome::Inactive;
        }

        let r = sampler.sample();
        let stake = self.account.balance() * scale_fraction(self.scale_index);
        let pnl = stake * r;

        self.account.apply_pnl(pnl);
        self.trade_count += 1;
        if r > Decimal::ZERO {
            self.win_count += 1;
        }
        self.scale_index = self.scale_index.wrapping_add(1);

        if !self.hit_target && self.account.balance() >= target {
            self.hit_target = true;
        }

        TradeOutcome::Traded(TradeRecord {
            pnl,
            return_fraction: r,
            stake,
        })
    }

    /// Debit this agent's share of a colony harvest
    pub fn harvest(&mut self, rate: Decimal) -> Result<Decimal, AccountError> {
        self.account.harvest(rate)
    }

    /// Record a venue fill reported for one of this agent's orders
    pub fn record_fill(&mut self) {
        self.fill_count += 1;
    }

    /// Record a venue rejection for one of this agent's orders
    pub fn record_reject(&mut self) {
        self.reject_count += 1;
    }
}

/// Trade-size fraction for a scale cursor position
///
/// The sequence is the first eight primes read as percentages
/// (2% … 19%), cycled forever.
#[inline]
pub fn scale_fraction(scale_index: usize) -> Decimal {
    let prime = SCALE_PRIMES[scale_index % SCALE_PRIMES.len()];
    Decimal::new(prime as i64, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixed_sampler(values: Vec<Decimal>) -> ReturnSampler {
        ReturnSampler::from_history(values, Some(0)).unwrap()
    }

    #[test]
    fn test_scale_fraction_cycles() {
        assert_eq!(scale_fraction(0), dec!(0.02));
        assert_eq!(scale_fraction(1), dec!(0.03));
        assert_eq!(scale_fraction(7), dec!(0.19));
        assert_eq!(scale_fraction(8), dec!(0.02));
    }

    #[test]
    fn test_step_applies_documented_formula() {
        let mut sampler = fixed_sampler(vec![dec!(0.05)]);
        let mut agent = Agent::new(AgentId(0), dec!(100)).unwrap();

        // First trade: stake = 100 × 0.02, pnl = stake × 0.05
        let outcome = agent.step(&mut sampler, dec!(1000000));
        match outcome {
            TradeOutcome::Traded(record) => {
                assert_eq!(record.stake, dec!(2.00));
                assert_eq!(record.pnl, dec!(0.1000));
            }
            TradeOutcome::Inactive => panic!("agent should have traded"),
        }
        assert_eq!(agent.equity(), dec!(100.1000));
        assert_eq!(agent.trade_count, 1);
        assert_eq!(agent.win_count, 1);
        assert_eq!(agent.scale_index, 1);
    }

    #[test]
    fn test_negative_return_is_not_a_win() {
        let mut sampler = fixed_sampler(vec![dec!(-0.05)]);
        let mut agent = Agent::new(AgentId(0), dec!(100)).unwrap();

        agent.step(&mut sampler, dec!(1000000));
        assert_eq!(agent.trade_count, 1);
        assert_eq!(agent.win_count, 0);
        assert!(agent.equity() < dec!(100));
    }

    #[test]
    fn test_ruined_agent_never_trades_again() {
        let mut sampler = fixed_sampler(vec![dec!(0.05)]);
        let mut agent = Agent::new(AgentId(0), dec!(100)).unwrap();
        agent.account.apply_pnl(dec!(-200));
        assert!(agent.is_ruined());

        for _ in 0..10 {
            assert_eq!(agent.step(&mut sampler, dec!(1000000)), TradeOutcome::Inactive);
        }
        assert_eq!(agent.equity(), Decimal::ZERO);
        assert_eq!(agent.trade_count, 0);
    }

    #[test]
    fn test_agent_at_target_stops_trading_and_latches() {
        let mut sampler = fixed_sampler(vec![dec!(0.05)]);
        let mut agent = Agent::new(AgentId(0), dec!(100)).unwrap();
        agent.account.apply_pnl(dec!(900));

        assert_eq!(agent.step(&mut sampler, dec!(1000)), TradeOutcome::Inactive);
        assert_eq!(agent.trade_count, 0);
    }

    #[test]
    fn test_hit_target_latches_on_crossing() {
        let mut sampler = fixed_sampler(vec![dec!(0.50)]);
        let mut agent = Agent::new(AgentId(0), dec!(100)).unwrap();

        // 100 + 100×0.02×0.5 = 101, crossing a 101 target exactly
        agent.step(&mut sampler, dec!(101));
        assert!(agent.hit_target);
        assert_eq!(agent.step(&mut sampler, dec!(101)), TradeOutcome::Inactive);
    }
}
