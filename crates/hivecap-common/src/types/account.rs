//! Equity account - per-trader capital management
//!
//! Every simulated trader owns one account. Key characteristics:
//! - Balance moves only through applied trade pnl and profit harvests
//! - A balance at or below zero is "ruin": the account is frozen for good
//! - Harvests debit profit only; the starting principal is untouchable

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account operation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Harvest rate must be within (0, 1], got {rate}")]
    InvalidHarvestRate { rate: Decimal },

    #[error("Starting equity must be positive, got {start}")]
    InvalidStartingEquity { start: Decimal },
}

/// Decimal capital account with profit-only harvesting
///
/// The account tracks the starting principal alongside the live balance so
/// profit can always be computed exactly. All arithmetic is `Decimal`;
/// floats never touch capital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityAccount {
    /// Starting principal
    start: Decimal,

    /// Current balance
    balance: Decimal,
}

impl EquityAccount {
    /// Open an account with the given starting principal
    pub fn open(start: Decimal) -> Result<Self, AccountError> {
        if start <= Decimal::ZERO {
            return Err(AccountError::InvalidStartingEquity { start });
        }
        Ok(Self {
            start,
            balance: start,
        })
    }

    /// Current balance
    #[inline]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Starting principal
    #[inline]
    pub fn start(&self) -> Decimal {
        self.start
    }

    /// Profit since the account was opened (may be negative)
    #[inline]
    pub fn profit_since_start(&self) -> Decimal {
        self.balance - self.start
    }

    /// Whether the account is ruined (balance at or below zero)
    ///
    /// Ruin is terminal: a ruined account ignores further pnl.
    #[inline]
    pub fn is_ruined(&self) -> bool {
        self.balance <= Decimal::ZERO
    }

    /// Apply one trade's signed pnl
    ///
    /// Clamps at zero: a loss larger than the balance ruins the account
    /// rather than taking it negative. No-op once ruined.
    pub fn apply_pnl(&mut self, pnl: Decimal) {
        if self.is_ruined() {
            return;
        }
        self.balance += pnl;
        if self.balance < Decimal::ZERO {
            self.balance = Decimal::ZERO;
        }
    }

    /// Debit `rate` of the positive profit, returning the harvested amount
    ///
    /// With no profit this is a no-op returning zero. The debit can never
    /// reach into the starting principal.
    pub fn harvest(&mut self, rate: Decimal) -> Result<Decimal, AccountError> {
        if rate <= Decimal::ZERO || rate > Decimal::ONE {
            return Err(AccountError::InvalidHarvestRate { rate });
        }

        let profit = self.profit_since_start();
        if profit <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let cut = profit * rate;
        self.balance -= cut;
        Ok(cut)
    }
}

impl std::fmt::Display for EquityAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EquityAccount(balance={}, start={})",
            self.balance, self.start
        )
    }
}
