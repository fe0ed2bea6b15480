//! Foundation types for Silt, a DFS-backed content-addressed object database.
//!
//! This crate defines the small vocabulary shared by every other crate:
//!
//! - [`ObjectId`] -- 32-byte BLAKE3 content address of a stored object
//! - [`Timestamp`] -- millisecond wall-clock instant used for pack stamping
//! - [`Clock`] -- time source abstraction, with [`SystemClock`] for production
//!   and [`ManualClock`] for deterministic tests
//!
//! Nothing here performs I/O.

pub mod error;
pub mod object;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use error::TypeError;
pub use object::ObjectId;
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
