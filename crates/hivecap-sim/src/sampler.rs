//! Historical return sampler
//!
//! Supplies per-trade percentage returns drawn uniformly at random, with
//! replacement, from a fixed historical data set loaded once at startup.
//! The draw is the only side effect; re-seeding yields a fresh but
//! statistically equivalent stream.

use hivecap_common::{HiveError, Result};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;

/// Bundled per-trade return history, used when no data file is configured
///
/// Signed return fractions, one realized trade each.
static DEFAULT_HISTORY: Lazy<Vec<Decimal>> = Lazy::new(|| {
    vec![
        dec!(0.0212),
        dec!(-0.0145),
        dec!(0.0324),
        dec!(0.0087),
        dec!(-0.0261),
        dec!(0.0178),
        dec!(-0.0093),
        dec!(0.0405),
        dec!(0.0051),
        dec!(-0.0187),
        dec!(0.0236),
        dec!(-0.0312),
        dec!(0.0129),
        dec!(0.0068),
        dec!(-0.0054),
        dec!(0.0291),
        dec!(-0.0226),
        dec!(0.0113),
        dec!(0.0342),
        dec!(-0.0076),
        dec!(0.0164),
        dec!(-0.0138),
        dec!(0.0097),
        dec!(0.0253),
    ]
});

/// Uniform sampler over a fixed return history
#[derive(Debug, Clone)]
pub struct ReturnSampler {
    history: Vec<Decimal>,
    rng: StdRng,
}

impl ReturnSampler {
    /// Build a sampler over an explicit history
    ///
    /// Fails with a configuration error when the history is empty.
    pub fn from_history(history: Vec<Decimal>, seed: Option<u64>) -> Result<Self> {
        if history.is_empty() {
            return Err(HiveError::Config("return history is empty".into()));
        }
        Ok(Self {
            history,
            rng: Self::rng_for(seed),
        })
    }

    /// Build a sampler from CSV text: one return fraction per line
    ///
    /// Blank lines and `#` comment lines are skipped. Any unparseable line
    /// is a configuration error.
    pub fn from_csv_str(text: &str, seed: Option<u64>) -> Result<Self> {
        let mut history = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let value: Decimal = line.parse().map_err(|e| {
                HiveError::Config(format!(
                    "bad return value {:?} on line {}: {}",
                    line,
                    lineno + 1,
                    e
                ))
            })?;
            history.push(value);
        }
        Self::from_history(history, seed)
    }

    /// Build a sampler from a CSV file on disk
    pub fn from_csv_path(path: impl AsRef<Path>, seed: Option<u64>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            HiveError::Config(format!("cannot read return history {}: {}", path.display(), e))
        })?;
        Self::from_csv_str(&text, seed)
    }

    /// Build a sampler over the bundled default history
    pub fn with_default_history(seed: Option<u64>) -> Self {
        Self {
            history: DEFAULT_HISTORY.clone(),
            rng: Self::rng_for(seed),
        }
    }

    /// Draw one return fraction, uniformly with replacement
    pub fn sample(&mut self) -> Decimal {
        let idx = self.rng.gen_range(0..self.history.len());
        self.history[idx]
    }

    /// Restart the stream from a new seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Number of historical returns backing the sampler
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the history is empty (never true for a constructed sampler)
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn rng_for(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
