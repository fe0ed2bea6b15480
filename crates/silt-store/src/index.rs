use serde::{Deserialize, Serialize};

use silt_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// One index record: where an object lives inside the pack blob.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: ObjectId,
    pub offset: u64,
    pub crc32: u32,
}

/// Lookup index for one pack: entries sorted by object id, plus the pack
/// trailer checksum for cross-validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackIndex {
    entries: Vec<IndexEntry>,
    pack_checksum: [u8; 20],
}

impl PackIndex {
    /// Build an index from unsorted entries.
    pub fn build(mut entries: Vec<IndexEntry>, pack_checksum: [u8; 20]) -> Self {
        entries.sort_by_key(|e| e.id);
        Self {
            entries,
            pack_checksum,
        }
    }

    /// Locate an object: `(offset, crc32)` if present.
    pub fn lookup(&self, id: &ObjectId) -> Option<(u64, u32)> {
        self.entries
            .binary_search_by_key(id, |e| e.id)
            .ok()
            .map(|i| (self.entries[i].offset, self.entries[i].crc32))
    }

    /// Membership test.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.binary_search_by_key(id, |e| e.id).is_ok()
    }

    /// All object ids in the pack, sorted.
    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.entries.iter().map(|e| &e.id)
    }

    /// Number of objects indexed.
    pub fn object_count(&self) -> usize {
        self.entries.len()
    }

    /// Trailer checksum of the pack this index belongs to.
    pub fn pack_checksum(&self) -> &[u8; 20] {
        &self.pack_checksum
    }

    /// Serialize for storage alongside the pack.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize from stored bytes.
    pub fn from_bytes(data: &[u8]) -> StoreResult<Self> {
        bincode::deserialize(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
