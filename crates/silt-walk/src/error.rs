use thiserror::Error;

use silt_store::StoreError;
use silt_types::ObjectId;

/// Errors from graph traversal.
#[derive(Debug, Error)]
pub enum WalkError {
    /// A reachable object references an id no pack contains.
    #[error("missing object {0}")]
    MissingObject(ObjectId),

    /// An object decoded to something its kind does not allow.
    #[error("corrupt object {id}: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    /// The underlying pack store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for walk operations.
pub type WalkResult<T> = Result<T, WalkError>;
