//! Garbage collection and pack consolidation for Silt.
//!
//! A repository accumulates many small `Insert` packs as objects land. The
//! [`GarbageCollector`] periodically reorganizes them: reachable history is
//! consolidated into at most one `Gc` pack (branch and tag roots) and one
//! `GcRest` pack (all other roots), unreachable objects are quarantined into
//! `UnreachableGarbage` packs, and old garbage is merged or pruned under the
//! [`GcConfig`] policy. The cycle commits as one atomic pack-set swap, so
//! concurrent readers always see a consistent pack list.

pub mod collector;
pub mod config;
pub mod error;
pub mod estimate;

pub use collector::{GarbageCollector, GcReport};
pub use config::GcConfig;
pub use error::{GcError, GcResult};
pub use estimate::estimated_pack_size;
