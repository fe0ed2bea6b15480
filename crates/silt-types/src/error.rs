use thiserror::Error;

/// Errors from parsing or constructing foundation types.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A hex string could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A byte buffer had the wrong length.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
