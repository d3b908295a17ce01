//! # Hivecap Runtime
//!
//! Wires the simulation and the admission layer together and drives both
//! on their own cadences:
//!
//! - a *simulation scheduler* steps the queen controller once per period
//!   and enqueues the resulting trade intents, and
//! - a faster *drain scheduler* forwards admitted orders to the venue
//!   within the rate budget.
//!
//! Agents never await fills: execution reports flow back over a channel
//! and are applied at the top of the next simulation tick, so fill
//! application is always serialized with stepping.

pub mod config;
pub mod persist;
pub mod runtime;

pub use config::RunConfig;
pub use persist::SnapshotRecord;
pub use runtime::{HiveRuntime, StopHandle};
