//! Snapshot persistence
//!
//! One JSON record per write, combining the population snapshot with the
//! queue's cumulative order counters. Persisting is best-effort: a write
//! failure is logged as a warning and absorbed, never fatal to a run.

use std::path::Path;

use chrono::{DateTime, Utc};
use hivecap_oms::QueueStatsSnapshot;
use hivecap_sim::HiveSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hivecap_common::Result;

/// Persisted run snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Wall-clock capture time
    pub timestamp: DateTime<Utc>,
    /// Population state
    #[serde(flatten)]
    pub snapshot: HiveSnapshot,
    /// Cumulative order counters
    pub orders: QueueStatsSnapshot,
}

impl SnapshotRecord {
    /// Stamp a snapshot with the current wall-clock time
    pub fn capture(snapshot: HiveSnapshot, orders: QueueStatsSnapshot) -> Self {
        Self {
            timestamp: Utc::now(),
            snapshot,
            orders,
        }
    }
}

/// Write a snapshot record as pretty JSON
pub fn write_snapshot(path: &Path, record: &SnapshotRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), step = record.snapshot.step, "snapshot written");
    Ok(())
}

/// Write a snapshot record, downgrading any failure to a warning
pub fn write_snapshot_best_effort(path: &Path, record: &SnapshotRecord) {
    if let Err(err) = write_snapshot(path, record) {
        warn!(path = %path.display(), %err, "snapshot write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SnapshotRecord {
        SnapshotRecord::capture(
            HiveSnapshot {
                step: 7,
                total_colonies: 1,
                total_agents: 4,
                total_equity: rust_decimal_macros::dec!(412.50),
                total_harvested: rust_decimal_macros::dec!(3.20),
                harvest_pool: rust_decimal_macros::dec!(3.20),
                max_generation: 0,
                colonies: vec![],
                split_events: vec![],
            },
            QueueStatsSnapshot {
                enqueued: 28,
                processed: 25,
                filled: 24,
                rejected: 1,
                timed_out: 0,
                cancelled: 3,
                queued_depth: 0,
            },
        )
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let record = record();

        write_snapshot(&path, &record).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: SnapshotRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_best_effort_write_absorbs_failure() {
        let path = Path::new("/nonexistent-hivecap-dir/snapshot.json");
        // Must not panic or propagate
        write_snapshot_best_effort(path, &record());
    }
}
