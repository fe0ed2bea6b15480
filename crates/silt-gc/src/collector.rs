//! The collection cycle: classify, consolidate, coalesce, prune, commit.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use silt_refs::RefProvider;
use silt_store::{
    InMemoryPackWriter, ObjectDatabase, PackDescription, PackExt, PackFile, PackSource,
    PackWriter, StoreReader, StoredObject,
};
use silt_types::{Clock, ObjectId, SystemClock};
use silt_walk::{reachable_sets, DatabaseGraph, WalkError};

use crate::config::GcConfig;
use crate::error::GcResult;
use crate::estimate::estimated_pack_size;

/// Outcome of one collection cycle.
#[derive(Clone, Debug)]
pub struct GcReport {
    /// Whether the cycle committed any change to the pack set.
    pub changed: bool,
    /// Packs retired by the commit.
    pub packs_removed: usize,
    /// Descriptions of the packs written by this cycle.
    pub packs_written: Vec<PackDescription>,
    /// Objects reachable from any ref at cycle time.
    pub reachable_objects: usize,
    /// Unreachable objects written into garbage packs this cycle.
    pub garbage_objects: usize,
}

/// Runs garbage collection cycles against one repository.
///
/// A cycle snapshots the pack list, walks reachability from the current
/// refs, consolidates live history into at most one `Gc` and one `GcRest`
/// pack, quarantines unreachable objects into garbage packs per the
/// coalescing policy, prunes expired garbage, and commits the whole result
/// as a single atomic pack-set replacement. Any failure before the commit
/// leaves the registry untouched.
///
/// At most one cycle may run per repository at a time; callers provide that
/// mutual exclusion. Readers and writers may proceed concurrently: packs
/// inserted after the snapshot survive the commit and are classified by the
/// next cycle.
pub struct GarbageCollector {
    db: Arc<ObjectDatabase>,
    refs: Arc<dyn RefProvider>,
    writer: Box<dyn PackWriter>,
    clock: Arc<dyn Clock>,
    config: GcConfig,
}

impl GarbageCollector {
    /// Create a collector with the default config, writer, and clock.
    pub fn new(db: Arc<ObjectDatabase>, refs: Arc<dyn RefProvider>) -> Self {
        Self {
            db,
            refs,
            writer: Box::new(InMemoryPackWriter),
            clock: Arc::new(SystemClock),
            config: GcConfig::default(),
        }
    }

    /// Replace the TTL and coalescing configuration.
    pub fn with_config(mut self, config: GcConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the pack writer.
    pub fn with_writer(mut self, writer: Box<dyn PackWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Run one collection cycle.
    ///
    /// Returns a report describing what the cycle did; `changed` is false
    /// when the pack set was already fully consolidated and no housekeeping
    /// applied, in which case nothing was written or removed.
    pub fn run(&self) -> GcResult<GcReport> {
        let ttl_millis = self.config.ttl_millis()?;
        let now = self.clock.now();
        let snapshot = self.db.packs();

        let mut inserts = Vec::new();
        let mut old_gc = Vec::new();
        let mut old_gc_rest = Vec::new();
        let mut garbage_packs = Vec::new();
        for pack in snapshot.iter() {
            match pack.description().source() {
                PackSource::Insert => inserts.push(Arc::clone(pack)),
                PackSource::Gc => old_gc.push(Arc::clone(pack)),
                PackSource::GcRest => old_gc_rest.push(Arc::clone(pack)),
                PackSource::UnreachableGarbage => garbage_packs.push(Arc::clone(pack)),
            }
        }
        debug!(
            inserts = inserts.len(),
            garbage = garbage_packs.len(),
            total = snapshot.len(),
            "collection cycle started"
        );

        let refs = self.refs.all_refs()?;
        let reachable = {
            let mut graph = DatabaseGraph::over(Arc::clone(&snapshot));
            reachable_sets(&mut graph, &refs)?
        };

        let mut reader = StoreReader::over(Arc::clone(&snapshot));

        // A garbage pack holding a now-reachable object is rescued: it is
        // consumed this cycle so its live content migrates back into the
        // consolidated packs and its remainder joins the new garbage.
        let mut rescued = Vec::new();
        let mut standing_garbage = Vec::new();
        for pack in &garbage_packs {
            let ids = pack.object_ids(&mut reader)?;
            if ids.iter().any(|id| reachable.contains(id)) {
                rescued.push(Arc::clone(pack));
            } else {
                standing_garbage.push(Arc::clone(pack));
            }
        }

        // If the consolidated packs already hold exactly the reachable
        // closures and nothing new arrived, skip the rewrite entirely so a
        // back-to-back cycle commits nothing.
        let live_current = inserts.is_empty()
            && rescued.is_empty()
            && matches_closure(&mut reader, &old_gc, &reachable.primary)?
            && matches_closure(&mut reader, &old_gc_rest, &reachable.secondary)?;

        let mut consumed: Vec<Arc<PackFile>> = Vec::new();
        let mut new_garbage: BTreeSet<ObjectId> = BTreeSet::new();
        let mut garbage_inputs: Vec<u64> = Vec::new();
        let mut to_add: Vec<Arc<PackFile>> = Vec::new();

        if !live_current {
            consumed.extend(inserts.iter().cloned());
            consumed.extend(old_gc.iter().cloned());
            consumed.extend(old_gc_rest.iter().cloned());
            consumed.extend(rescued.iter().cloned());

            for pack in &consumed {
                let mut contributed = false;
                for id in pack.object_ids(&mut reader)? {
                    if !reachable.contains(&id) {
                        new_garbage.insert(id);
                        contributed = true;
                    }
                }
                if contributed {
                    garbage_inputs.push(pack_size(pack));
                }
            }

            // Insert and rescued packs are charged to both live estimates:
            // until the walk resolves, their objects could land in either
            // output. The estimate stays an upper bound on each.
            let mut shared_sizes: Vec<u64> = inserts.iter().map(|p| pack_size(p)).collect();
            shared_sizes.extend(rescued.iter().map(|p| pack_size(p)));

            if !reachable.primary.is_empty() {
                let mut sizes = shared_sizes.clone();
                sizes.extend(old_gc.iter().map(|p| pack_size(p)));
                let ids: BTreeSet<ObjectId> = reachable.primary.iter().copied().collect();
                let objects = load_objects(&mut reader, &ids)?;
                to_add.push(self.writer.write_pack(
                    PackSource::Gc,
                    objects,
                    estimated_pack_size(&sizes),
                    now,
                )?);
            }
            if !reachable.secondary.is_empty() {
                let mut sizes = shared_sizes;
                sizes.extend(old_gc_rest.iter().map(|p| pack_size(p)));
                let ids: BTreeSet<ObjectId> = reachable.secondary.iter().copied().collect();
                let objects = load_objects(&mut reader, &ids)?;
                to_add.push(self.writer.write_pack(
                    PackSource::GcRest,
                    objects,
                    estimated_pack_size(&sizes),
                    now,
                )?);
            }
        }

        // Coalescing: merge the standing garbage packs with this cycle's
        // new garbage into one pack when the combined size fits the limit.
        let limit = self.config.coalesce_garbage_limit;
        let standing_total: u64 = standing_garbage.iter().map(|p| pack_size(p)).sum();
        let merge_inputs = standing_garbage.len() + usize::from(!new_garbage.is_empty());
        let coalesce = limit > 0
            && merge_inputs >= 2
            && standing_total + estimated_pack_size(&garbage_inputs) <= limit;

        let mut coalesced: Vec<Arc<PackFile>> = Vec::new();
        let mut garbage_out = new_garbage;
        let mut garbage_out_inputs = garbage_inputs;
        if coalesce {
            for pack in &standing_garbage {
                garbage_out.extend(pack.object_ids(&mut reader)?);
                garbage_out_inputs.push(pack_size(pack));
                coalesced.push(Arc::clone(pack));
            }
        }
        if !garbage_out.is_empty() {
            let objects = load_objects(&mut reader, &garbage_out)?;
            to_add.push(self.writer.write_pack(
                PackSource::UnreachableGarbage,
                objects,
                estimated_pack_size(&garbage_out_inputs),
                now,
            )?);
        }

        // TTL pruning drops expired garbage packs outright. The most
        // recently created garbage pack always survives its TTL: a reader
        // may still be racing against the objects it quarantines.
        let newest_garbage = garbage_packs
            .iter()
            .map(|p| p.description())
            .max_by(|a, b| {
                a.last_modified()
                    .cmp(&b.last_modified())
                    .then_with(|| a.name().cmp(b.name()))
            })
            .cloned();
        let mut pruned: Vec<Arc<PackFile>> = Vec::new();
        if !coalesce && ttl_millis > 0 {
            for pack in &standing_garbage {
                let desc = pack.description();
                if newest_garbage.as_ref() == Some(desc) {
                    continue;
                }
                if now.millis_since(desc.last_modified()) > ttl_millis {
                    pruned.push(Arc::clone(pack));
                }
            }
        }

        let to_remove: Vec<PackDescription> = consumed
            .iter()
            .chain(coalesced.iter())
            .chain(pruned.iter())
            .map(|p| p.description().clone())
            .collect();

        if to_remove.is_empty() && to_add.is_empty() {
            debug!("collection cycle found nothing to do");
            return Ok(GcReport {
                changed: false,
                packs_removed: 0,
                packs_written: Vec::new(),
                reachable_objects: reachable.len(),
                garbage_objects: 0,
            });
        }

        self.db.replace_pack_set(&to_remove, to_add.clone())?;

        info!(
            removed = to_remove.len(),
            written = to_add.len(),
            reachable = reachable.len(),
            garbage = garbage_out.len(),
            pruned = pruned.len(),
            "collection cycle committed"
        );
        Ok(GcReport {
            changed: true,
            packs_removed: to_remove.len(),
            packs_written: to_add.iter().map(|p| p.description().clone()).collect(),
            reachable_objects: reachable.len(),
            garbage_objects: garbage_out.len(),
        })
    }
}

impl std::fmt::Debug for GarbageCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarbageCollector")
            .field("config", &self.config)
            .finish()
    }
}

fn pack_size(pack: &PackFile) -> u64 {
    pack.description().file_size(PackExt::Pack)
}

/// Whether `packs` is exactly one pack holding exactly `closure`, or no
/// pack when the closure is empty.
fn matches_closure(
    reader: &mut StoreReader,
    packs: &[Arc<PackFile>],
    closure: &HashSet<ObjectId>,
) -> GcResult<bool> {
    if closure.is_empty() {
        return Ok(packs.is_empty());
    }
    if packs.len() != 1 {
        return Ok(false);
    }
    let pack = &packs[0];
    if pack.description().object_count() as usize != closure.len() {
        return Ok(false);
    }
    let ids = pack.object_ids(reader)?;
    Ok(ids.iter().all(|id| closure.contains(id)))
}

fn load_objects(
    reader: &mut StoreReader,
    ids: &BTreeSet<ObjectId>,
) -> GcResult<Vec<StoredObject>> {
    let mut objects = Vec::with_capacity(ids.len());
    for id in ids {
        let object = reader
            .read_object(id)?
            .ok_or(WalkError::MissingObject(*id))?;
        objects.push(object);
    }
    Ok(objects)
}
