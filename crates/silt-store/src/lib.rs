//! Pack registry and object storage model for Silt.
//!
//! A repository's objects live in immutable, append-only *packs*: opaque
//! blobs of compressed objects plus a lookup index. This crate owns the pack
//! data model and the registry that makes a set of packs visible to readers:
//!
//! - [`PackSource`] -- how a pack came to exist (insert, consolidation,
//!   garbage)
//! - [`PackDescription`] -- immutable per-pack metadata (sizes, stamp,
//!   estimate)
//! - [`PackFile`] -- read-only handle to one pack's bytes and index
//! - [`PackBuilder`] / [`PackWriter`] -- pack production
//! - [`ObjectDatabase`] -- the registry, with atomic pack-set replacement
//! - [`StoreReader`] -- scoped reader for a batch of lookups
//!
//! # Design Rules
//!
//! 1. Packs are immutable once committed; they are superseded wholesale,
//!    never mutated in place.
//! 2. Every registry mutation goes through the atomic replace operation;
//!    readers see the pre-image or the post-image, never a partial set.
//! 3. Retired packs stay readable through readers that captured them;
//!    reclamation is deferred by reference counting.
//! 4. All I/O and codec errors are propagated, never silently ignored.

pub mod builder;
pub mod database;
pub mod description;
pub mod error;
pub mod file;
pub mod index;
pub mod object;
pub mod source;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::{InMemoryPackWriter, PackBuilder, PackWriter, PACK_OVERHEAD_BYTES};
pub use database::{ObjectDatabase, StoreReader};
pub use description::PackDescription;
pub use error::{StoreError, StoreResult};
pub use file::PackFile;
pub use index::PackIndex;
pub use object::{Blob, Commit, ObjectKind, StoredObject, Tree, TreeEntry};
pub use source::{PackExt, PackSource};
