use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use silt_types::{ObjectId, Timestamp};

use crate::description::PackDescription;
use crate::error::{StoreError, StoreResult};
use crate::file::PackFile;
use crate::index::{IndexEntry, PackIndex};
use crate::object::StoredObject;
use crate::source::PackSource;

/// Magic bytes at the start of every pack blob.
pub const PACK_MAGIC: &[u8; 4] = b"SILT";
/// Current pack format version.
pub const PACK_VERSION: u32 = 1;
/// Bytes of header: magic + version + object count.
pub const PACK_HEADER_BYTES: u64 = 12;
/// Bytes of trailer: truncated BLAKE3 checksum of everything before it.
pub const PACK_TRAILER_BYTES: u64 = 20;
/// Combined header + trailer cost of one pack blob.
///
/// When packs are merged this much is deduplicated per input pack, which is
/// what the size estimator subtracts.
pub const PACK_OVERHEAD_BYTES: u64 = PACK_HEADER_BYTES + PACK_TRAILER_BYTES;

/// Compression level for pack entries.
const ZSTD_LEVEL: i32 = 3;

/// Builds one pack blob plus its index from a collection of objects.
///
/// Duplicate objects are silently dropped; entries are sorted by id before
/// encoding so identical object sets produce identical packs.
pub struct PackBuilder {
    source: PackSource,
    entries: Vec<(ObjectId, StoredObject)>,
    seen: HashSet<ObjectId>,
}

impl PackBuilder {
    /// Start a pack of the given source.
    pub fn new(source: PackSource) -> Self {
        Self {
            source,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Queue an object. Returns `false` if it was already queued.
    pub fn add_object(&mut self, object: StoredObject) -> bool {
        let id = object.compute_id();
        if !self.seen.insert(id) {
            return false;
        }
        self.entries.push((id, object));
        true
    }

    /// Number of objects queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no objects are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the pack and its index, producing a committed-ready handle.
    ///
    /// `estimated_size` is the projected size recorded on the description;
    /// pass `None` to use the real encoded size (ordinary inserts).
    pub fn finish(
        mut self,
        last_modified: Timestamp,
        estimated_size: Option<u64>,
    ) -> StoreResult<Arc<PackFile>> {
        self.entries.sort_by_key(|(id, _)| *id);

        let mut pack_data = Vec::new();
        pack_data.extend_from_slice(PACK_MAGIC);
        pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack_data.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        let mut index_entries = Vec::with_capacity(self.entries.len());
        for (id, object) in &self.entries {
            let offset = pack_data.len() as u64;
            pack_data.push(object.kind.type_byte());

            let compressed = zstd::encode_all(object.data.as_slice(), ZSTD_LEVEL)
                .map_err(|e| StoreError::CompressionFailed(e.to_string()))?;

            encode_varint(&mut pack_data, object.data.len() as u64);
            encode_varint(&mut pack_data, compressed.len() as u64);

            let crc32 = crc32fast::hash(&compressed);
            pack_data.extend_from_slice(&compressed);

            index_entries.push(IndexEntry {
                id: *id,
                offset,
                crc32,
            });
        }

        let mut checksum = [0u8; 20];
        checksum.copy_from_slice(&blake3::hash(&pack_data).as_bytes()[..20]);
        pack_data.extend_from_slice(&checksum);

        let index = PackIndex::build(index_entries, checksum);
        let index_bytes = index.to_bytes()?;

        let pack_size = pack_data.len() as u64;
        let description = PackDescription::new(
            self.source,
            last_modified,
            self.entries.len() as u64,
            pack_size,
            index_bytes.len() as u64,
            estimated_size.unwrap_or(pack_size),
        );
        debug!(
            pack = %description.name(),
            source = %self.source,
            objects = self.entries.len(),
            bytes = pack_size,
            "encoded pack"
        );
        Ok(Arc::new(PackFile::new(description, pack_data, index_bytes)))
    }
}

/// Produces pack files from object sets on behalf of the collector.
///
/// The collector never encodes packs itself; it hands the objects, the
/// estimate, and the stamp to a writer so storage backends can be swapped
/// (and failures injected in tests).
pub trait PackWriter: Send + Sync {
    /// Write a pack of `source` containing exactly `objects`.
    fn write_pack(
        &self,
        source: PackSource,
        objects: Vec<StoredObject>,
        estimated_size: u64,
        last_modified: Timestamp,
    ) -> StoreResult<Arc<PackFile>>;
}

/// Default writer: encodes packs in memory via [`PackBuilder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryPackWriter;

impl PackWriter for InMemoryPackWriter {
    fn write_pack(
        &self,
        source: PackSource,
        objects: Vec<StoredObject>,
        estimated_size: u64,
        last_modified: Timestamp,
    ) -> StoreResult<Arc<PackFile>> {
        let mut builder = PackBuilder::new(source);
        for object in objects {
            builder.add_object(object);
        }
        builder.finish(last_modified, Some(estimated_size))
    }
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8]) -> StoreResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(StoreError::CorruptEntry {
                offset: 0,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(StoreError::CorruptEntry {
        offset: 0,
        reason: "truncated varint".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn blob(content: &[u8]) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, content.to_vec())
    }

    #[test]
    fn varint_roundtrip() {
        for value in [0u64, 1, 42, 127, 128, 1_000_000, u64::MAX] {
            let mut buf = Vec::new();
            encode_varint(&mut buf, value);
            let (decoded, consumed) = decode_varint(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn decode_varint_truncated() {
        let err = decode_varint(&[0x80]).unwrap_err();
        assert!(matches!(err, StoreError::CorruptEntry { .. }));
    }

    #[test]
    fn duplicate_objects_dropped() {
        let mut builder = PackBuilder::new(PackSource::Insert);
        assert!(builder.add_object(blob(b"once")));
        assert!(!builder.add_object(blob(b"once")));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn identical_object_sets_encode_identically() {
        let stamp = Timestamp::from_millis(5);

        let mut a = PackBuilder::new(PackSource::Gc);
        a.add_object(blob(b"one"));
        a.add_object(blob(b"two"));
        let mut b = PackBuilder::new(PackSource::Gc);
        b.add_object(blob(b"two"));
        b.add_object(blob(b"one"));

        let pack_a = a.finish(stamp, None).unwrap();
        let pack_b = b.finish(stamp, None).unwrap();
        assert_eq!(pack_a.pack_bytes(), pack_b.pack_bytes());
    }

    #[test]
    fn empty_pack_is_pure_overhead() {
        let pack = PackBuilder::new(PackSource::Insert)
            .finish(Timestamp::from_millis(1), None)
            .unwrap();
        assert_eq!(
            pack.description().file_size(crate::source::PackExt::Pack),
            PACK_OVERHEAD_BYTES
        );
    }

    #[test]
    fn estimate_defaults_to_real_size() {
        let mut builder = PackBuilder::new(PackSource::Insert);
        builder.add_object(blob(b"content"));
        let pack = builder.finish(Timestamp::from_millis(1), None).unwrap();
        let desc = pack.description();
        assert_eq!(
            desc.estimated_pack_size(),
            desc.file_size(crate::source::PackExt::Pack)
        );
    }

    #[test]
    fn explicit_estimate_is_recorded() {
        let mut builder = PackBuilder::new(PackSource::Gc);
        builder.add_object(blob(b"content"));
        let pack = builder
            .finish(Timestamp::from_millis(1), Some(9_999))
            .unwrap();
        assert_eq!(pack.description().estimated_pack_size(), 9_999);
    }
}
