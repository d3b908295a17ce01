//! # Hivecap Common
//!
//! Shared types and errors for the Hivecap capital-simulation engine.
//!
//! ## Core Types
//!
//! - [`EquityAccount`]: guarded decimal balance backing every simulated trader
//! - [`ColonyId`]/[`AgentId`]: ordinal identifiers for colonies and their agents
//! - [`HiveError`]: unified error taxonomy across simulation, queue, and sink

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{HiveError, QueueError, Result, SinkError};
pub use types::{
    account::{AccountError, EquityAccount},
    ids::{AgentId, ColonyId},
};

/// Hivecap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of agents per colony
pub const DEFAULT_AGENTS_PER_COLONY: u32 = 100;

/// Trade-size scale sequence (first eight primes, read as percent)
pub const SCALE_PRIMES: [u32; 8] = [2, 3, 5, 7, 11, 13, 17, 19];
