use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use silt_types::{ObjectId, Timestamp};

use crate::builder::PackBuilder;
use crate::description::PackDescription;
use crate::error::{StoreError, StoreResult};
use crate::file::PackFile;
use crate::index::PackIndex;
use crate::object::StoredObject;
use crate::source::PackSource;

/// The pack registry: the authoritative, per-repository list of pack files.
///
/// The pack list is the only mutable shared state in the engine. Every
/// mutation goes through [`replace_pack_set`], which swaps the list as a
/// single visible transition; a concurrent [`packs`] call sees either the
/// pre-image or the post-image, never a partial set. Pack contents are
/// immutable once committed and are only ever superseded wholesale.
///
/// Retired packs remain readable through readers that captured them before
/// the swap; the `Arc` reference count defers physical reclamation until no
/// reader can still reach them.
///
/// [`replace_pack_set`]: ObjectDatabase::replace_pack_set
/// [`packs`]: ObjectDatabase::packs
pub struct ObjectDatabase {
    packs: RwLock<Vec<Arc<PackFile>>>,
    /// Lazily rebuilt ordered scan list handed to readers. Invalidated on
    /// every pack-set change and by `clear_cache`.
    scan_cache: RwLock<Option<Arc<Vec<Arc<PackFile>>>>>,
}

impl ObjectDatabase {
    /// Create an empty database (a freshly opened repository).
    pub fn new() -> Self {
        Self {
            packs: RwLock::new(Vec::new()),
            scan_cache: RwLock::new(None),
        }
    }

    /// Current pack list, ordered newest first.
    ///
    /// The returned list is a snapshot: later commits do not mutate it.
    pub fn packs(&self) -> Arc<Vec<Arc<PackFile>>> {
        if let Some(cached) = self.scan_cache.read().expect("lock poisoned").as_ref() {
            return Arc::clone(cached);
        }
        // Hold the pack-list lock until the cache is published. Publishing
        // after releasing it could overwrite the invalidation done by a
        // replacement that committed in between, leaving the pre-image
        // cached for later readers.
        let packs = self.packs.read().expect("lock poisoned");
        let mut list: Vec<Arc<PackFile>> = packs.iter().cloned().collect();
        list.sort_by(|a, b| {
            b.description()
                .last_modified()
                .cmp(&a.description().last_modified())
                .then_with(|| a.description().name().cmp(b.description().name()))
        });
        let list = Arc::new(list);
        *self.scan_cache.write().expect("lock poisoned") = Some(Arc::clone(&list));
        drop(packs);
        list
    }

    /// Number of registered packs.
    pub fn pack_count(&self) -> usize {
        self.packs.read().expect("lock poisoned").len()
    }

    /// Atomically remove exactly the named descriptions and add new packs.
    ///
    /// If any description in `remove` is no longer registered (another
    /// writer committed in between), the whole replacement is rejected with
    /// [`StoreError::StalePackSet`] and the registry is left untouched.
    /// Packs added by other writers since the caller's snapshot survive the
    /// swap.
    pub fn replace_pack_set(
        &self,
        remove: &[PackDescription],
        add: Vec<Arc<PackFile>>,
    ) -> StoreResult<()> {
        let mut packs = self.packs.write().expect("lock poisoned");

        for description in remove {
            let present = packs.iter().any(|p| p.description() == description);
            if !present {
                return Err(StoreError::StalePackSet {
                    missing: description.name().to_string(),
                });
            }
        }

        packs.retain(|p| !remove.iter().any(|d| d == p.description()));
        let added = add.len();
        packs.extend(add);
        drop(packs);

        self.invalidate_scan_cache();
        info!(removed = remove.len(), added, "replaced pack set");
        Ok(())
    }

    /// Drop cached open-pack state, forcing re-resolution from the current
    /// pack list on next access.
    pub fn clear_cache(&self) {
        self.invalidate_scan_cache();
        debug!("cleared pack handle cache");
    }

    /// Write `objects` as a new `Insert` pack and register it.
    ///
    /// Returns `Ok(None)` without touching the registry when `objects` is
    /// empty: packs with zero objects are never written.
    pub fn insert_objects(
        &self,
        objects: &[StoredObject],
        now: Timestamp,
    ) -> StoreResult<Option<Arc<PackFile>>> {
        let mut builder = PackBuilder::new(PackSource::Insert);
        for object in objects {
            builder.add_object(object.clone());
        }
        if builder.is_empty() {
            return Ok(None);
        }
        let pack = builder.finish(now, None)?;
        self.replace_pack_set(&[], vec![Arc::clone(&pack)])?;
        Ok(Some(pack))
    }

    /// Acquire a scoped reader over the current pack list.
    pub fn reader(&self) -> StoreReader {
        StoreReader::over(self.packs())
    }

    fn invalidate_scan_cache(&self) {
        *self.scan_cache.write().expect("lock poisoned") = None;
    }
}

impl Default for ObjectDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDatabase")
            .field("pack_count", &self.pack_count())
            .finish()
    }
}

/// Short-lived reader scoping a batch of lookups.
///
/// Holds the pack list as of acquisition plus a decoded-index cache, so a
/// pack set swap during the batch neither disturbs the reader nor re-decodes
/// indexes it has already touched. Packs retired mid-batch stay readable
/// for this reader's lifetime.
pub struct StoreReader {
    packs: Arc<Vec<Arc<PackFile>>>,
    indexes: HashMap<String, Arc<PackIndex>>,
}

impl StoreReader {
    /// Scope a reader over an explicit pack list snapshot.
    pub fn over(packs: Arc<Vec<Arc<PackFile>>>) -> Self {
        Self {
            packs,
            indexes: HashMap::new(),
        }
    }

    /// The pack list this reader was scoped over.
    pub fn packs(&self) -> &[Arc<PackFile>] {
        &self.packs
    }

    /// Membership test across all packs in scope.
    pub fn has_object(&mut self, id: &ObjectId) -> StoreResult<bool> {
        for pack in Arc::clone(&self.packs).iter() {
            if pack.has_object(self, id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Read an object from the first pack that has it.
    pub fn read_object(&mut self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        for pack in Arc::clone(&self.packs).iter() {
            if let Some(object) = pack.read_object(self, id)? {
                return Ok(Some(object));
            }
        }
        Ok(None)
    }

    /// Decoded index for `pack`, cached for this reader's lifetime.
    pub(crate) fn index_for(&mut self, pack: &PackFile) -> StoreResult<Arc<PackIndex>> {
        let name = pack.description().name();
        if let Some(index) = self.indexes.get(name) {
            return Ok(Arc::clone(index));
        }
        let index = pack.decode_index()?;
        self.indexes.insert(name.to_string(), Arc::clone(&index));
        Ok(index)
    }
}
