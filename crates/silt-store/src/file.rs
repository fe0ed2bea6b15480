use std::sync::Arc;

use silt_types::ObjectId;

use crate::builder::{decode_varint, PACK_MAGIC, PACK_TRAILER_BYTES, PACK_VERSION};
use crate::database::StoreReader;
use crate::description::PackDescription;
use crate::error::{StoreError, StoreResult};
use crate::index::PackIndex;
use crate::object::{ObjectKind, StoredObject};

/// Read-only handle to one stored pack: its bytes, its encoded index, and
/// its description.
///
/// A `PackFile` is immutable once created and shared via `Arc`; a pack
/// retired from the registry stays readable through any reader still holding
/// it, and its bytes are reclaimed when the last reference drops.
///
/// All lookups go through a [`StoreReader`], which owns the decoded-index
/// cache for its lifetime.
#[derive(Debug)]
pub struct PackFile {
    description: PackDescription,
    pack_data: Vec<u8>,
    index_bytes: Vec<u8>,
}

impl PackFile {
    pub(crate) fn new(
        description: PackDescription,
        pack_data: Vec<u8>,
        index_bytes: Vec<u8>,
    ) -> Self {
        Self {
            description,
            pack_data,
            index_bytes,
        }
    }

    /// Metadata for this pack.
    pub fn description(&self) -> &PackDescription {
        &self.description
    }

    /// Raw encoded pack bytes.
    pub fn pack_bytes(&self) -> &[u8] {
        &self.pack_data
    }

    /// Membership test through a scoped reader.
    pub fn has_object(&self, reader: &mut StoreReader, id: &ObjectId) -> StoreResult<bool> {
        Ok(reader.index_for(self)?.contains(id))
    }

    /// Read one object out of this pack; `Ok(None)` if it is not here.
    pub fn read_object(
        &self,
        reader: &mut StoreReader,
        id: &ObjectId,
    ) -> StoreResult<Option<StoredObject>> {
        let index = reader.index_for(self)?;
        match index.lookup(id) {
            Some((offset, crc32)) => Ok(Some(self.read_at_offset(offset, crc32, id)?)),
            None => Ok(None),
        }
    }

    /// All object ids in this pack, sorted.
    pub fn object_ids(&self, reader: &mut StoreReader) -> StoreResult<Vec<ObjectId>> {
        Ok(reader.index_for(self)?.object_ids().copied().collect())
    }

    /// Decode and validate the index for this pack.
    pub(crate) fn decode_index(&self) -> StoreResult<Arc<PackIndex>> {
        self.check_header()?;
        let index = PackIndex::from_bytes(&self.index_bytes)?;
        let trailer_start = self.pack_data.len() - PACK_TRAILER_BYTES as usize;
        if index.pack_checksum() != &self.pack_data[trailer_start..] {
            return Err(StoreError::TrailerMismatch {
                name: self.description.name().to_string(),
            });
        }
        Ok(Arc::new(index))
    }

    fn check_header(&self) -> StoreResult<()> {
        if self.pack_data.len() < 32 {
            return Err(StoreError::CorruptEntry {
                offset: 0,
                reason: "pack data too short".into(),
            });
        }
        if &self.pack_data[0..4] != PACK_MAGIC {
            return Err(StoreError::InvalidMagic {
                expected: String::from_utf8_lossy(PACK_MAGIC).into(),
                actual: String::from_utf8_lossy(&self.pack_data[0..4]).into(),
            });
        }
        let version = u32::from_be_bytes(self.pack_data[4..8].try_into().unwrap_or([0; 4]));
        if version != PACK_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        Ok(())
    }

    fn read_at_offset(
        &self,
        offset: u64,
        expected_crc: u32,
        id: &ObjectId,
    ) -> StoreResult<StoredObject> {
        let data = &self.pack_data;
        let mut pos = offset as usize;

        if pos >= data.len() {
            return Err(StoreError::CorruptEntry {
                offset,
                reason: "offset beyond pack data".into(),
            });
        }

        let type_byte = data[pos];
        pos += 1;

        let kind = ObjectKind::from_type_byte(type_byte).ok_or_else(|| {
            StoreError::CorruptEntry {
                offset,
                reason: format!("unknown type byte: {type_byte}"),
            }
        })?;

        let (uncompressed_size, consumed) = decode_varint(&data[pos..])?;
        pos += consumed;

        let (compressed_size, consumed) = decode_varint(&data[pos..])?;
        pos += consumed;

        let end = pos + compressed_size as usize;
        if end > data.len() {
            return Err(StoreError::CorruptEntry {
                offset,
                reason: "compressed data extends beyond pack".into(),
            });
        }
        let compressed = &data[pos..end];

        if crc32fast::hash(compressed) != expected_crc {
            return Err(StoreError::CrcMismatch { id: *id });
        }

        let decompressed = zstd::decode_all(compressed)
            .map_err(|e| StoreError::DecompressionFailed(e.to_string()))?;

        if decompressed.len() != uncompressed_size as usize {
            return Err(StoreError::CorruptEntry {
                offset,
                reason: format!(
                    "size mismatch: expected {uncompressed_size}, got {}",
                    decompressed.len()
                ),
            });
        }

        Ok(StoredObject::new(kind, decompressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PackBuilder;
    use crate::database::ObjectDatabase;
    use crate::source::PackSource;
    use silt_types::Timestamp;

    fn blob(content: &[u8]) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, content.to_vec())
    }

    fn build_pack(contents: &[&[u8]]) -> Arc<PackFile> {
        let mut builder = PackBuilder::new(PackSource::Insert);
        for content in contents {
            builder.add_object(blob(content));
        }
        builder.finish(Timestamp::from_millis(1), None).unwrap()
    }

    #[test]
    fn write_read_roundtrip() {
        let pack = build_pack(&[b"hello", b"world"]);
        let db = ObjectDatabase::new();
        let mut reader = db.reader();

        let id = blob(b"hello").compute_id();
        assert!(pack.has_object(&mut reader, &id).unwrap());

        let read = pack.read_object(&mut reader, &id).unwrap().unwrap();
        assert_eq!(read.kind, ObjectKind::Blob);
        assert_eq!(read.data, b"hello");
    }

    #[test]
    fn missing_object_is_none() {
        let pack = build_pack(&[b"present"]);
        let db = ObjectDatabase::new();
        let mut reader = db.reader();

        let id = blob(b"absent").compute_id();
        assert!(!pack.has_object(&mut reader, &id).unwrap());
        assert!(pack.read_object(&mut reader, &id).unwrap().is_none());
    }

    #[test]
    fn object_ids_lists_everything() {
        let pack = build_pack(&[b"a", b"b", b"c"]);
        let db = ObjectDatabase::new();
        let mut reader = db.reader();

        let ids = pack.object_ids(&mut reader).unwrap();
        assert_eq!(ids.len(), 3);
        for content in [b"a" as &[u8], b"b", b"c"] {
            assert!(ids.contains(&blob(content).compute_id()));
        }
    }

    #[test]
    fn bad_magic_rejected() {
        let good = build_pack(&[b"x"]);
        let mut bytes = good.pack_bytes().to_vec();
        bytes[0..4].copy_from_slice(b"BADM");
        let pack = PackFile::new(good.description().clone(), bytes, vec![]);
        let err = pack.decode_index().unwrap_err();
        assert!(matches!(err, StoreError::InvalidMagic { .. }));
    }

    #[test]
    fn bad_version_rejected() {
        let good = build_pack(&[b"x"]);
        let mut bytes = good.pack_bytes().to_vec();
        bytes[4..8].copy_from_slice(&99u32.to_be_bytes());
        let pack = PackFile::new(good.description().clone(), bytes, vec![]);
        let err = pack.decode_index().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(99)));
    }

    #[test]
    fn mismatched_index_rejected() {
        let a = build_pack(&[b"a"]);
        let b = build_pack(&[b"b"]);
        // Pair pack A's bytes with pack B's index.
        let b_index_bytes = b.decode_index().unwrap().to_bytes().unwrap();
        let franken = PackFile::new(a.description().clone(), a.pack_bytes().to_vec(), b_index_bytes);
        let err = franken.decode_index().unwrap_err();
        assert!(matches!(err, StoreError::TrailerMismatch { .. }));
    }
}
