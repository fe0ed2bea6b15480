use thiserror::Error;

/// Errors from reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// A ref name failed validation.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// The backing ref storage failed.
    #[error("ref storage error: {0}")]
    Storage(String),
}

/// Result alias for ref operations.
pub type RefResult<T> = Result<T, RefError>;
