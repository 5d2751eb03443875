//! Throughput estimator over per-second counter buckets.
//!
//! `record_event` increments the bucket for the current wall-clock
//! second; `current_rate` reads the bucket for the second before it.
//! Reading the last completed second keeps a partially-filled bucket
//! from being reported as the rate. Throughput is advisory: every store
//! failure degrades to "no signal" instead of surfacing an error.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use fleetgrid_store::SharedStore;

/// Store key prefix for throughput buckets, completed by the epoch second.
const BUCKET_PREFIX: &str = "throughput:";

/// Bucket expiry horizon. Must stay well above the one-second measurement
/// granularity so a bucket outlives the read that follows it.
const BUCKET_TTL: Duration = Duration::from_secs(10);

/// Counts ingestion events per second and reports the recent rate.
#[derive(Clone)]
pub struct ThroughputEstimator {
    store: Arc<dyn SharedStore>,
}

impl ThroughputEstimator {
    /// Create an estimator over the given store.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Count one ingestion event against the current second's bucket.
    pub fn record_event(&self) {
        self.record_at(epoch_secs());
    }

    /// Count one event against the bucket for an explicit epoch second.
    pub fn record_at(&self, epoch: u64) {
        let key = bucket_key(epoch);
        if let Err(e) = self.store.incr(&key, BUCKET_TTL) {
            debug!(%key, error = %e, "throughput increment dropped");
        }
    }

    /// Events per second, measured over the last completed second.
    pub fn current_rate(&self) -> u64 {
        self.rate_at(epoch_secs())
    }

    /// The rate as observed at an explicit epoch second: the count of the
    /// second before it. Absent, expired, or unreadable buckets read as 0.
    pub fn rate_at(&self, epoch: u64) -> u64 {
        let key = bucket_key(epoch.saturating_sub(1));
        match self.store.counter(&key) {
            Ok(Some(count)) => count,
            Ok(None) => 0,
            Err(e) => {
                debug!(%key, error = %e, "throughput read failed, reporting zero");
                0
            }
        }
    }
}

fn bucket_key(epoch: u64) -> String {
    format!("{BUCKET_PREFIX}{epoch}")
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
