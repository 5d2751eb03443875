//! fleetgrid-registry: the worker registry.
//!
//! Owns the set of known worker IDs (the membership index) and each
//! worker's mutable health record, both kept in the shared store. The
//! index and the records are written in an order that bounds what a
//! concurrent reader can observe: a worker that still exists, never a
//! dangling ID.

pub mod error;
pub mod registry;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use registry::WorkerRegistry;
pub use types::{WorkerRecord, WorkerStatus};
