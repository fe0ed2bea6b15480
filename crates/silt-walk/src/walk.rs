//! Lazy reachability traversal and ref-partitioned closure computation.

use std::collections::HashSet;

use tracing::debug;

use silt_refs::names::{classify_ref, RootCategory};
use silt_types::ObjectId;

use crate::error::WalkResult;
use crate::graph::ObjectGraph;

/// Depth-first traversal over an [`ObjectGraph`].
///
/// Yields each reachable object exactly once, in discovery order. Cycles
/// are tolerated: the visited set guards every push. The walk is lazy, so
/// dropping it early skips unvisited successors entirely.
pub struct Walk<'g, G: ObjectGraph> {
    graph: &'g mut G,
    stack: Vec<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl<'g, G: ObjectGraph> Walk<'g, G> {
    /// Start a walk from `roots`.
    pub fn new(graph: &'g mut G, roots: impl IntoIterator<Item = ObjectId>) -> Self {
        Self::with_visited(graph, roots, HashSet::new())
    }

    /// Start a walk from `roots`, treating `visited` as already seen.
    ///
    /// Seeded ids are neither yielded nor expanded, so a second walk seeded
    /// with a first walk's closure yields only objects unique to its own
    /// roots.
    pub fn with_visited(
        graph: &'g mut G,
        roots: impl IntoIterator<Item = ObjectId>,
        visited: HashSet<ObjectId>,
    ) -> Self {
        let mut walk = Self {
            graph,
            stack: Vec::new(),
            visited,
        };
        for root in roots {
            if walk.visited.insert(root) {
                walk.stack.push(root);
            }
        }
        walk
    }

    /// Ids seen so far, including any seeds.
    pub fn visited(&self) -> &HashSet<ObjectId> {
        &self.visited
    }

    /// Consume the walk, returning the visited set.
    pub fn into_visited(self) -> HashSet<ObjectId> {
        self.visited
    }
}

impl<G: ObjectGraph> Iterator for Walk<'_, G> {
    type Item = WalkResult<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        match self.graph.successors(&id) {
            Ok(successors) => {
                for successor in successors {
                    if self.visited.insert(successor) {
                        self.stack.push(successor);
                    }
                }
                Some(Ok(id))
            }
            Err(e) => {
                // A failed expansion poisons the traversal.
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

/// The two reachability closures a collection cycle consolidates around.
#[derive(Debug, Default)]
pub struct ReachableSets {
    /// Closure of primary roots (branches, tags, `HEAD`).
    pub primary: HashSet<ObjectId>,
    /// Closure of secondary roots, minus anything already primary.
    pub secondary: HashSet<ObjectId>,
}

impl ReachableSets {
    /// Membership in either closure.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.primary.contains(id) || self.secondary.contains(id)
    }

    /// Total reachable objects across both closures.
    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    /// Returns `true` if nothing is reachable.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

/// Compute both closures from a ref listing.
///
/// The primary walk runs first; the secondary walk is seeded with the
/// primary closure, so an object reachable from both kinds of roots lands
/// in `primary` only. The closures are therefore always disjoint.
pub fn reachable_sets<G: ObjectGraph>(
    graph: &mut G,
    refs: &[(String, ObjectId)],
) -> WalkResult<ReachableSets> {
    let mut primary_roots = Vec::new();
    let mut secondary_roots = Vec::new();
    for (name, target) in refs {
        match classify_ref(name) {
            RootCategory::Primary => primary_roots.push(*target),
            RootCategory::Secondary => secondary_roots.push(*target),
        }
    }

    let mut primary = HashSet::new();
    for id in Walk::new(graph, primary_roots) {
        primary.insert(id?);
    }

    let mut secondary = HashSet::new();
    for id in Walk::with_visited(graph, secondary_roots, primary.clone()) {
        secondary.insert(id?);
    }

    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        "computed reachability closures"
    );
    Ok(ReachableSets { primary, secondary })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::error::WalkError;

    /// Graph defined by an explicit adjacency map. Ids absent from the map
    /// are missing objects.
    struct MapGraph {
        edges: HashMap<ObjectId, Vec<ObjectId>>,
    }

    impl MapGraph {
        fn new(edges: &[(&[u8], &[&[u8]])]) -> Self {
            Self {
                edges: edges
                    .iter()
                    .map(|(from, to)| {
                        (
                            ObjectId::from_bytes(from),
                            to.iter().map(|t| ObjectId::from_bytes(t)).collect(),
                        )
                    })
                    .collect(),
            }
        }
    }

    impl ObjectGraph for MapGraph {
        fn successors(&mut self, id: &ObjectId) -> WalkResult<Vec<ObjectId>> {
            self.edges
                .get(id)
                .cloned()
                .ok_or(WalkError::MissingObject(*id))
        }
    }

    fn oid(seed: &[u8]) -> ObjectId {
        ObjectId::from_bytes(seed)
    }

    #[test]
    fn walk_visits_each_node_once() {
        // Diamond: a -> b, a -> c, b -> d, c -> d.
        let mut graph = MapGraph::new(&[
            (b"a", &[b"b", b"c"]),
            (b"b", &[b"d"]),
            (b"c", &[b"d"]),
            (b"d", &[]),
        ]);
        let visited: Vec<ObjectId> = Walk::new(&mut graph, [oid(b"a")])
            .collect::<WalkResult<_>>()
            .unwrap();
        assert_eq!(visited.len(), 4);
    }

    #[test]
    fn walk_tolerates_cycles() {
        let mut graph = MapGraph::new(&[(b"a", &[b"b"]), (b"b", &[b"a"])]);
        let visited: Vec<ObjectId> = Walk::new(&mut graph, [oid(b"a")])
            .collect::<WalkResult<_>>()
            .unwrap();
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn walk_reports_missing_object() {
        let mut graph = MapGraph::new(&[(b"a", &[b"gone"])]);
        let result: WalkResult<Vec<ObjectId>> = Walk::new(&mut graph, [oid(b"a")]).collect();
        assert!(matches!(result, Err(WalkError::MissingObject(_))));
    }

    #[test]
    fn seeded_walk_skips_seen_subgraph() {
        let mut graph = MapGraph::new(&[(b"a", &[b"shared"]), (b"b", &[b"shared"]), (b"shared", &[])]);

        let mut first_walk = Walk::new(&mut graph, [oid(b"a")]);
        for id in &mut first_walk {
            id.unwrap();
        }
        let first = first_walk.into_visited();
        let second: Vec<ObjectId> = Walk::with_visited(&mut graph, [oid(b"b")], first)
            .collect::<WalkResult<_>>()
            .unwrap();
        // Only "b" itself is new; "shared" was already seen.
        assert_eq!(second, vec![oid(b"b")]);
    }

    #[test]
    fn reachable_sets_partitions_by_root_category() {
        let mut graph = MapGraph::new(&[
            (b"main-tip", &[b"base"]),
            (b"note-tip", &[b"note-data"]),
            (b"base", &[]),
            (b"note-data", &[]),
        ]);
        let refs = vec![
            ("refs/heads/main".to_string(), oid(b"main-tip")),
            ("refs/notes/review".to_string(), oid(b"note-tip")),
        ];

        let sets = reachable_sets(&mut graph, &refs).unwrap();
        assert!(sets.primary.contains(&oid(b"main-tip")));
        assert!(sets.primary.contains(&oid(b"base")));
        assert!(sets.secondary.contains(&oid(b"note-tip")));
        assert!(sets.secondary.contains(&oid(b"note-data")));
        assert_eq!(sets.len(), 4);
    }

    #[test]
    fn shared_objects_land_in_primary_only() {
        // Both a branch and a note reach "shared".
        let mut graph = MapGraph::new(&[
            (b"branch-tip", &[b"shared"]),
            (b"note-tip", &[b"shared"]),
            (b"shared", &[]),
        ]);
        let refs = vec![
            ("refs/heads/main".to_string(), oid(b"branch-tip")),
            ("refs/notes/n".to_string(), oid(b"note-tip")),
        ];

        let sets = reachable_sets(&mut graph, &refs).unwrap();
        assert!(sets.primary.contains(&oid(b"shared")));
        assert!(!sets.secondary.contains(&oid(b"shared")));
        assert_eq!(sets.secondary.len(), 1);
    }

    #[test]
    fn no_refs_means_nothing_reachable() {
        let mut graph = MapGraph::new(&[]);
        let sets = reachable_sets(&mut graph, &[]).unwrap();
        assert!(sets.is_empty());
    }

    #[test]
    fn duplicate_roots_are_deduplicated() {
        let mut graph = MapGraph::new(&[(b"tip", &[])]);
        let refs = vec![
            ("refs/heads/main".to_string(), oid(b"tip")),
            ("refs/heads/alias".to_string(), oid(b"tip")),
        ];
        let sets = reachable_sets(&mut graph, &refs).unwrap();
        assert_eq!(sets.primary.len(), 1);
    }
}
