//! Collector configuration.

use std::time::Duration;

use crate::error::{GcError, GcResult};

/// Tunables for one collection cycle.
#[derive(Clone, Copy, Debug)]
pub struct GcConfig {
    /// Minimum age a garbage pack must reach before it may be pruned.
    /// Zero disables age-based pruning entirely.
    pub garbage_ttl: Duration,
    /// Combined-size ceiling under which garbage packs are merged into one.
    /// Zero disables coalescing, so each cycle writes its own garbage pack.
    pub coalesce_garbage_limit: u64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            garbage_ttl: Duration::from_secs(24 * 60 * 60),
            coalesce_garbage_limit: 50 << 20,
        }
    }
}

impl GcConfig {
    /// Disable both pruning and coalescing; every cycle only classifies.
    pub fn keep_everything() -> Self {
        Self {
            garbage_ttl: Duration::ZERO,
            coalesce_garbage_limit: 0,
        }
    }

    /// The TTL in milliseconds, the resolution pack stamps carry.
    ///
    /// Rejects a TTL too large to compare against millisecond stamps.
    pub fn ttl_millis(&self) -> GcResult<u64> {
        u64::try_from(self.garbage_ttl.as_millis())
            .map_err(|_| GcError::InvalidConfig("garbage TTL overflows milliseconds".into()))
    }
}
