//! fleetgrid-throughput: sliding-window throughput estimation.
//!
//! Ingestion events are counted into per-second buckets in the shared
//! store; the reported rate is the count of the last completed second.
//! Buckets expire on their own, so there is no sweep job, and the
//! estimator is stateless over the store.

pub mod estimator;

pub use estimator::ThroughputEstimator;
