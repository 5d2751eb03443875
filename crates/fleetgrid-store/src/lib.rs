//! fleetgrid-store: the shared key-value store boundary.
//!
//! The core subsystems (throughput estimator, worker registry) talk to a
//! generic shared store through the [`SharedStore`] trait: atomic counters
//! with a time-to-live, opaque values, batch reads, and membership sets.
//! Values are opaque `Vec<u8>`; callers supply their own encoding.
//!
//! [`EmbeddedStore`] is the redb-backed implementation used by the daemon,
//! with an in-memory backend for tests. Each trait operation runs in a
//! single transaction and is individually atomic; multi-call compositions
//! built on top of the trait are not.

pub mod embedded;
pub mod error;
pub mod store;
pub mod tables;

pub use embedded::EmbeddedStore;
pub use error::{StoreError, StoreResult};
pub use store::SharedStore;
