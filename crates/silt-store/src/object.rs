use serde::{Deserialize, Serialize};

use silt_types::{ObjectId, Timestamp};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A point in history: tree + parents + message.
    Commit,
    /// Directory listing: entries mapping names to object references.
    Tree,
    /// Raw content (file contents, arbitrary data).
    Blob,
}

impl ObjectKind {
    /// Wire tag used in pack entries and for hash domain separation.
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
        }
    }

    /// Parse from a wire tag.
    pub fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Tree => write!(f, "tree"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// The pack layer never interprets `data`; only the graph accessor decodes
/// commits and trees to find their successors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    ///
    /// The kind tag is hashed ahead of the data so that identical bytes of
    /// different kinds cannot collide.
    pub fn compute_id(&self) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[self.kind.type_byte()]);
        hasher.update(&self.data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A commit object: a snapshot of a tree plus links to its parents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of this commit.
    pub tree: ObjectId,
    /// Parent commits, oldest first. Empty for a root commit.
    pub parents: Vec<ObjectId>,
    /// Human-readable commit message.
    pub message: String,
    /// When the commit was created.
    pub timestamp: Timestamp,
}

impl Commit {
    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Commit {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected commit, got {}", obj.kind),
            });
        }
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name (filename or directory name).
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
        }
    }
}

/// Directory listing object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name for deterministic hashing.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries, sorted by name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Tree {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected tree, got {}", obj.kind),
            });
        }
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Blob {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected blob, got {}", obj.kind),
            });
        }
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let blob = Blob::new(b"hello world".to_vec());
        let stored = blob.to_stored_object();
        let decoded = Blob::from_stored_object(&stored).unwrap();
        assert_eq!(blob, decoded);
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, b"not a blob".to_vec());
        let err = Blob::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::new("zebra.txt", ObjectId::null()),
            TreeEntry::new("alpha.txt", ObjectId::null()),
        ]);
        assert_eq!(tree.entries[0].name, "alpha.txt");
        assert_eq!(tree.entries[1].name, "zebra.txt");
    }

    #[test]
    fn tree_roundtrip() {
        let tree = Tree::new(vec![TreeEntry::new(
            "file.txt",
            ObjectId::from_bytes(b"content"),
        )]);
        let stored = tree.to_stored_object().unwrap();
        let decoded = Tree::from_stored_object(&stored).unwrap();
        assert_eq!(tree, decoded);
    }

    #[test]
    fn commit_roundtrip() {
        let commit = Commit {
            tree: ObjectId::from_bytes(b"root"),
            parents: vec![ObjectId::from_bytes(b"parent")],
            message: "initial".into(),
            timestamp: Timestamp::from_millis(1_000),
        };
        let stored = commit.to_stored_object().unwrap();
        assert_eq!(stored.kind, ObjectKind::Commit);
        let decoded = Commit::from_stored_object(&stored).unwrap();
        assert_eq!(commit, decoded);
    }

    #[test]
    fn commit_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Blob, b"junk".to_vec());
        let err = Commit::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn stored_object_id_deterministic() {
        let obj = StoredObject::new(ObjectKind::Blob, b"deterministic".to_vec());
        assert_eq!(obj.compute_id(), obj.compute_id());
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
    }

    #[test]
    fn type_byte_roundtrip() {
        for kind in [ObjectKind::Commit, ObjectKind::Tree, ObjectKind::Blob] {
            assert_eq!(ObjectKind::from_type_byte(kind.type_byte()), Some(kind));
        }
        assert_eq!(ObjectKind::from_type_byte(0), None);
        assert_eq!(ObjectKind::from_type_byte(99), None);
    }
}
