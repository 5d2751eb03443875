//! Error types for registry operations.
//!
//! "Worker not found" is not an error: `update_health` reports it as
//! `Ok(None)` and `deregister` treats it as a no-op.

use thiserror::Error;

use fleetgrid_store::StoreError;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Caller-supplied worker ID is empty or blank. Rejected before any
    /// store call.
    #[error("invalid worker id: {0}")]
    InvalidInput(String),

    /// The shared store failed. Transient and retryable; mutating
    /// operations pass this through unchanged.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] StoreError),

    /// A worker record could not be encoded for storage.
    #[error("record encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}
