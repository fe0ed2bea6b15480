//! Object-graph access: resolving an id to the ids it references.

use std::sync::Arc;

use silt_store::{Commit, ObjectKind, PackFile, StoreReader, StoredObject, Tree};
use silt_types::ObjectId;

use crate::error::{WalkError, WalkResult};

/// Successor resolution over the object graph.
///
/// Implementations take `&mut self` so they can cache decoded state across
/// lookups within one traversal.
pub trait ObjectGraph {
    /// The ids directly referenced by `id`.
    ///
    /// Commits reference their parents and their root tree; trees reference
    /// their entries; blobs reference nothing. An unknown id is an error:
    /// reachability must never silently skip a dangling edge.
    fn successors(&mut self, id: &ObjectId) -> WalkResult<Vec<ObjectId>>;
}

/// [`ObjectGraph`] backed by a pack list snapshot.
///
/// Reads go through a scoped [`StoreReader`], so packs retired by a
/// concurrent pack-set swap stay resolvable for the lifetime of this graph.
pub struct DatabaseGraph {
    reader: StoreReader,
}

impl DatabaseGraph {
    /// Scope a graph over an explicit pack list snapshot.
    pub fn over(packs: Arc<Vec<Arc<PackFile>>>) -> Self {
        Self {
            reader: StoreReader::over(packs),
        }
    }

    fn decode_successors(id: &ObjectId, object: &StoredObject) -> WalkResult<Vec<ObjectId>> {
        match object.kind {
            ObjectKind::Commit => {
                let commit = Commit::from_stored_object(object).map_err(|e| WalkError::Corrupt {
                    id: *id,
                    reason: e.to_string(),
                })?;
                let mut out = Vec::with_capacity(commit.parents.len() + 1);
                out.push(commit.tree);
                out.extend(commit.parents);
                Ok(out)
            }
            ObjectKind::Tree => {
                let tree = Tree::from_stored_object(object).map_err(|e| WalkError::Corrupt {
                    id: *id,
                    reason: e.to_string(),
                })?;
                Ok(tree.entries.into_iter().map(|e| e.object_id).collect())
            }
            ObjectKind::Blob => Ok(Vec::new()),
        }
    }
}

impl ObjectGraph for DatabaseGraph {
    fn successors(&mut self, id: &ObjectId) -> WalkResult<Vec<ObjectId>> {
        let object = self
            .reader
            .read_object(id)?
            .ok_or(WalkError::MissingObject(*id))?;
        Self::decode_successors(id, &object)
    }
}
