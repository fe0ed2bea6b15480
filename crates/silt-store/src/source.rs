use serde::{Deserialize, Serialize};

/// How a pack came to exist.
///
/// This is a closed set: every consumption site (classification, size
/// estimation, pruning) matches exhaustively so adding a source is a
/// compile-time-checked change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackSource {
    /// Freshly written by an inserter, not yet consolidated.
    Insert,
    /// Consolidated pack of objects reachable from primary refs
    /// (`HEAD`, `refs/heads/*`, `refs/tags/*`).
    Gc,
    /// Consolidated pack of objects reachable only from secondary refs
    /// (e.g. `refs/notes/*`).
    GcRest,
    /// Objects unreachable from any ref at the last collection.
    UnreachableGarbage,
}

impl PackSource {
    /// Returns `true` for the garbage source.
    pub fn is_garbage(&self) -> bool {
        matches!(self, Self::UnreachableGarbage)
    }
}

impl std::fmt::Display for PackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Gc => write!(f, "gc"),
            Self::GcRest => write!(f, "gc-rest"),
            Self::UnreachableGarbage => write!(f, "unreachable-garbage"),
        }
    }
}

/// Extension of a file belonging to a pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackExt {
    /// The pack blob itself.
    Pack,
    /// The lookup index.
    Index,
}

impl std::fmt::Display for PackExt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pack => write!(f, "pack"),
            Self::Index => write!(f, "idx"),
        }
    }
}
