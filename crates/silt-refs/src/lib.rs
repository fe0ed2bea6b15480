//! Reference management for Silt: named root pointers into the object graph.
//!
//! The garbage collector seeds its reachability walk from the full ref set
//! and partitions roots into two categories:
//!
//! - **Primary**: `HEAD`, `refs/heads/*`, `refs/tags/*` -- history that
//!   belongs in the consolidated `Gc` pack
//! - **Secondary**: everything else (e.g. `refs/notes/*`) -- history that
//!   belongs in the `GcRest` pack
//!
//! The classification is a pure function of the ref name; see
//! [`names::classify_ref`].

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{RefError, RefResult};
pub use memory::InMemoryRefStore;
pub use names::{classify_ref, validate_ref_name, RootCategory};
pub use traits::RefProvider;
