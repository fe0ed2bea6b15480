use thiserror::Error;

use silt_types::ObjectId;

/// Errors from pack storage and registry operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The pack bytes do not start with the expected magic.
    #[error("invalid pack magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    /// The pack was written by an unknown format version.
    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    /// A pack entry is structurally invalid.
    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    /// Per-entry CRC32 check failed.
    #[error("CRC32 mismatch for object {id}")]
    CrcMismatch { id: ObjectId },

    /// Whole-pack trailer checksum check failed.
    #[error("pack trailer checksum mismatch for {name}")]
    TrailerMismatch { name: String },

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Entry decompression failed.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// Entry compression failed.
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A pack-set replacement named a pack that is no longer registered.
    ///
    /// Another writer committed in between; the caller's snapshot is stale
    /// and the replacement was rejected without any visible change.
    #[error("stale pack set: {missing} is no longer registered")]
    StalePackSet { missing: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
