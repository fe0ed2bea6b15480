//! The [`RefProvider`] trait: the collector's view of ref storage.

use silt_types::ObjectId;

use crate::error::RefResult;

/// Yields the full set of named root pointers.
///
/// The garbage collector calls [`all_refs`] exactly once per cycle to seed
/// its reachability walk; refs updated after that call are not required to
/// be reflected until the next cycle. Implementations must be thread-safe.
///
/// [`all_refs`]: RefProvider::all_refs
pub trait RefProvider: Send + Sync {
    /// All refs as `(canonical name, target object id)` pairs.
    fn all_refs(&self) -> RefResult<Vec<(String, ObjectId)>>;
}
