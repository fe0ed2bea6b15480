use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use silt_types::Timestamp;

use crate::source::{PackExt, PackSource};

/// Immutable-after-creation metadata for one pack.
///
/// Identity is the unique `name`; two descriptions with the same name refer
/// to the same pack regardless of how they were obtained.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackDescription {
    name: String,
    source: PackSource,
    file_sizes: HashMap<PackExt, u64>,
    estimated_pack_size: u64,
    last_modified: Timestamp,
    object_count: u64,
}

impl PackDescription {
    /// Create a description with a freshly generated unique name.
    pub fn new(
        source: PackSource,
        last_modified: Timestamp,
        object_count: u64,
        pack_size: u64,
        index_size: u64,
        estimated_pack_size: u64,
    ) -> Self {
        let mut file_sizes = HashMap::new();
        file_sizes.insert(PackExt::Pack, pack_size);
        file_sizes.insert(PackExt::Index, index_size);
        Self {
            name: format!("pack-{}", Uuid::now_v7().simple()),
            source,
            file_sizes,
            estimated_pack_size,
            last_modified,
            object_count,
        }
    }

    /// Unique pack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How this pack came to exist.
    pub fn source(&self) -> PackSource {
        self.source
    }

    /// On-disk byte size for one of the pack's files; zero if unknown.
    pub fn file_size(&self, ext: PackExt) -> u64 {
        self.file_sizes.get(&ext).copied().unwrap_or(0)
    }

    /// Projected size computed before the pack was written.
    ///
    /// Always a pessimistic upper bound on the real contribution of the
    /// objects written into the pack, never an exact prediction.
    pub fn estimated_pack_size(&self) -> u64 {
        self.estimated_pack_size
    }

    /// Creation/commit time, millisecond resolution.
    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    /// Number of objects in the pack.
    pub fn object_count(&self) -> u64 {
        self.object_count
    }
}

impl PartialEq for PackDescription {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PackDescription {}

impl Hash for PackDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for PackDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.source)
    }
}
