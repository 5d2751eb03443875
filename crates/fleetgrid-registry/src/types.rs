//! Domain types for the worker registry.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A worker's registry record.
///
/// Owned exclusively by the registry; other subsystems only consume
/// aggregates derived from the full set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerRecord {
    /// Stable external identifier. Immutable after creation.
    #[serde(rename = "worker_id")]
    pub id: String,
    pub status: WorkerStatus,
    /// Unix timestamp (seconds) when the worker first registered.
    pub registered_at: u64,
    /// Unix timestamp (seconds) of the most recent health report.
    pub last_heartbeat: u64,
    /// Events the worker reports having processed. Monotonic on the
    /// worker's side; last write wins here.
    pub processed_count: u64,
}

/// Lifecycle status of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Registered but not yet heard from.
    Registered,
    /// Has reported health at least once.
    Active,
}

impl WorkerRecord {
    /// Build a fresh record for a newly registering worker.
    pub fn new(id: impl Into<String>) -> Self {
        let now = epoch_secs();
        Self {
            id: id.into(),
            status: WorkerStatus::Registered,
            registered_at: now,
            last_heartbeat: now,
            processed_count: 0,
        }
    }
}

pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
