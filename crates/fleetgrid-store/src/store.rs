//! The [`SharedStore`] trait: the narrow interface the core consumes.
//!
//! Services hold the store as `Arc<dyn SharedStore>`, so the daemon can
//! back them with the embedded redb store while tests substitute doubles.

use std::time::Duration;

use crate::error::StoreResult;

/// A shared key-value store with counters, opaque values, and sets.
///
/// Each operation is individually atomic. Missing keys are reported as
/// `None`/absent, never as errors; errors mean the store itself failed.
pub trait SharedStore: Send + Sync {
    /// Atomically increment the integer counter at `key` by one and
    /// refresh its time-to-live. Returns the new count. An expired
    /// counter restarts from zero.
    fn incr(&self, key: &str, ttl: Duration) -> StoreResult<u64>;

    /// Read the counter at `key`. Expired or absent counters read as `None`.
    fn counter(&self, key: &str) -> StoreResult<Option<u64>>;

    /// Read the opaque value at `key`.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write the opaque value at `key`, overwriting any existing value.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Read the opaque values for `keys`, in order. Missing keys yield
    /// `None` at their position.
    fn batch_get(&self, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>>;

    /// Add `member` to the set at `set`. Adding an existing member is a no-op.
    fn set_add(&self, set: &str, member: &str) -> StoreResult<()>;

    /// Remove `member` from the set at `set`. Removing an absent member is
    /// a no-op.
    fn set_remove(&self, set: &str, member: &str) -> StoreResult<()>;

    /// List all members of the set at `set`.
    fn set_members(&self, set: &str) -> StoreResult<Vec<String>>;

    /// Delete the opaque value at `key`. Deleting an absent key is a no-op.
    fn delete(&self, key: &str) -> StoreResult<()>;
}
