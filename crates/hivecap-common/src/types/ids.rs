//! Ordinal identifiers for colonies and agents
//!
//! Both ids are plain ordinals: colonies are numbered in spawn order by the
//! controller, agents in creation order within their colony. Keeping them as
//! newtypes stops the two from being swapped at call sites.

use serde::{Deserialize, Serialize};

/// Identifier of a colony, assigned in spawn order (root colony is 0)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ColonyId(pub u32);

impl std::fmt::Display for ColonyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "colony-{}", self.0)
    }
}

/// Identifier of an agent, ordinal within its owning colony
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}
