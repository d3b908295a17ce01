//! Error types for the Hivecap engine
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using HiveError
pub type Result<T> = std::result::Result<T, HiveError>;

/// Unified error type for Hivecap operations
#[derive(Debug, Error)]
pub enum HiveError {
    // Account errors
    #[error("Account error: {0}")]
    Account(#[from] crate::types::account::AccountError),

    // Admission queue errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    // Order sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    // Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    // Snapshot/serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Admission queue errors
///
/// Per-order failures: a full queue rejects the order, the caller may retry
/// later. Never fatal to a running simulation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue full: depth {depth} at configured maximum {max_depth}")]
    Full { depth: usize, max_depth: usize },

    #[error("Unknown order: {0}")]
    UnknownOrder(uuid::Uuid),

    #[error("Order {order_id} is {status} and can no longer be cancelled")]
    NotCancellable {
        order_id: uuid::Uuid,
        status: String,
    },
}

/// Order sink errors
///
/// All of these resolve the affected order as rejected; none of them halt
/// the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Order rejected by venue: {reason}")]
    Rejected { reason: String },

    #[error("Sink unresponsive after {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

// Implement From for common external error types
impl From<serde_json::Error> for HiveError {
    fn from(err: serde_json::Error) -> Self {
        HiveError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for HiveError {
    fn from(err: std::io::Error) -> Self {
        HiveError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for HiveError {
    fn from(err: anyhow::Error) -> Self {
        HiveError::Internal(err.to_string())
    }
}
