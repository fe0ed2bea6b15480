use thiserror::Error;

use silt_refs::RefError;
use silt_store::StoreError;
use silt_walk::WalkError;

/// Errors from a collection cycle.
///
/// Every failure is local to the cycle that raised it: the registry is left
/// in its pre-cycle state and the whole cycle is safe to retry.
#[derive(Debug, Error)]
pub enum GcError {
    /// The collector configuration is unusable.
    #[error("invalid collector configuration: {0}")]
    InvalidConfig(String),

    /// Another writer changed the pack set between snapshot and commit.
    ///
    /// Retryable: recompute from a fresh snapshot.
    #[error("pack set changed during collection; rerun against a fresh snapshot")]
    ConcurrentModification,

    /// Reachability traversal failed.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// The ref provider failed.
    #[error(transparent)]
    Ref(#[from] RefError),

    /// Pack storage failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for GcError {
    fn from(e: StoreError) -> Self {
        match e {
            // A stale replacement means a concurrent writer won the race.
            StoreError::StalePackSet { .. } => Self::ConcurrentModification,
            other => Self::Store(other),
        }
    }
}

/// Result alias for collector operations.
pub type GcResult<T> = Result<T, GcError>;
