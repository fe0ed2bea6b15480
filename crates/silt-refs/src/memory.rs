use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use silt_types::ObjectId;

use crate::error::RefResult;
use crate::names::validate_ref_name;
use crate::traits::RefProvider;

/// In-memory ref store for tests and embedding.
///
/// Refs are held in a `BTreeMap` behind a `RwLock`, so listings come back in
/// a stable, sorted order.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, ObjectId>>,
}

impl InMemoryRefStore {
    /// Create an empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or move a ref.
    ///
    /// Short names are treated as branches: a name that is not `HEAD` and
    /// does not start with `refs/` is prefixed with `refs/heads/`.
    pub fn update(&self, name: &str, target: ObjectId) -> RefResult<String> {
        let canonical = Self::canonicalize(name);
        validate_ref_name(&canonical)?;
        self.refs
            .write()
            .expect("lock poisoned")
            .insert(canonical.clone(), target);
        debug!(name = %canonical, target = %target.short_hex(), "updated ref");
        Ok(canonical)
    }

    /// Delete a ref by name. Returns `true` if it existed.
    pub fn delete(&self, name: &str) -> bool {
        let canonical = Self::canonicalize(name);
        self.refs
            .write()
            .expect("lock poisoned")
            .remove(&canonical)
            .is_some()
    }

    /// Number of refs.
    pub fn len(&self) -> usize {
        self.refs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no refs exist.
    pub fn is_empty(&self) -> bool {
        self.refs.read().expect("lock poisoned").is_empty()
    }

    fn canonicalize(name: &str) -> String {
        if name == "HEAD" || name.starts_with("refs/") {
            name.to_string()
        } else {
            format!("refs/heads/{name}")
        }
    }
}

impl RefProvider for InMemoryRefStore {
    fn all_refs(&self) -> RefResult<Vec<(String, ObjectId)>> {
        Ok(self
            .refs
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(name, id)| (name.clone(), *id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(seed: &[u8]) -> ObjectId {
        ObjectId::from_bytes(seed)
    }

    #[test]
    fn short_names_become_branches() {
        let store = InMemoryRefStore::new();
        let canonical = store.update("master", oid(b"c0")).unwrap();
        assert_eq!(canonical, "refs/heads/master");
    }

    #[test]
    fn canonical_names_kept_verbatim() {
        let store = InMemoryRefStore::new();
        assert_eq!(
            store.update("refs/notes/note1", oid(b"c1")).unwrap(),
            "refs/notes/note1"
        );
        assert_eq!(store.update("HEAD", oid(b"c2")).unwrap(), "HEAD");
    }

    #[test]
    fn update_moves_existing_ref() {
        let store = InMemoryRefStore::new();
        store.update("main", oid(b"old")).unwrap();
        store.update("main", oid(b"new")).unwrap();

        let refs = store.all_refs().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].1, oid(b"new"));
    }

    #[test]
    fn invalid_name_rejected() {
        let store = InMemoryRefStore::new();
        assert!(store.update("bad..name", oid(b"x")).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn delete_ref() {
        let store = InMemoryRefStore::new();
        store.update("main", oid(b"c0")).unwrap();
        assert!(store.delete("main"));
        assert!(!store.delete("main"));
        assert!(store.is_empty());
    }

    #[test]
    fn all_refs_sorted_by_name() {
        let store = InMemoryRefStore::new();
        store.update("zeta", oid(b"z")).unwrap();
        store.update("alpha", oid(b"a")).unwrap();
        store.update("refs/notes/n", oid(b"n")).unwrap();

        let names: Vec<String> = store.all_refs().unwrap().into_iter().map(|(n, _)| n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
