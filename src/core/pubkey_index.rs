// src/core/pubkey_index.rs

//! Concurrent mapping from canonical hex pubkey to provenance source tag.
//!
//! Backed by `DashMap`, the same concurrent map the teacher uses for its
//! client registry and cache indices — many-writer, many-reader, safe
//! iteration for the reconcile/purge sweeps below.

use dashmap::DashMap;
use std::collections::HashSet;

/// A concurrent pubkey -> source-tag index. Source tag is either the
/// literal `"relay"` or an ACL source id.
#[derive(Debug, Default)]
pub struct PubkeyIndex {
    entries: DashMap<String, String>,
}

impl PubkeyIndex {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Inserts `key` tagged with `source` if absent. First-writer-wins:
    /// if `key` is already present, its existing source is left untouched.
    pub fn upsert(&self, key: &str, source: &str) {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| source.to_string());
    }

    /// Looks up the source tag for `key`.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Removes every entry tagged `source` whose key is not in `desired`.
    /// Entries tagged with any other source are never touched. Traversal
    /// is weakly consistent: entries inserted concurrently during the
    /// sweep need not be visited.
    pub fn reconcile(&self, source: &str, desired: &HashSet<String>) {
        self.entries
            .retain(|key, tag| tag != source || desired.contains(key));
    }

    /// Removes every entry tagged `source`, regardless of key.
    pub fn purge(&self, source: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, tag| tag != source);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let idx = PubkeyIndex::new();
        idx.upsert("k1", "relay");
        idx.upsert("k1", "acl-a");
        assert_eq!(idx.lookup("k1").as_deref(), Some("relay"));
    }

    #[test]
    fn reconcile_only_touches_its_own_source() {
        let idx = PubkeyIndex::new();
        idx.upsert("k1", "acl-a");
        idx.upsert("k2", "acl-a");
        idx.upsert("k3", "relay");

        let desired: HashSet<String> = ["k1".to_string()].into_iter().collect();
        idx.reconcile("acl-a", &desired);

        assert!(idx.lookup("k1").is_some());
        assert!(idx.lookup("k2").is_none());
        assert_eq!(idx.lookup("k3").as_deref(), Some("relay"));
    }

    #[test]
    fn purge_removes_only_matching_source() {
        let idx = PubkeyIndex::new();
        idx.upsert("k1", "acl-a");
        idx.upsert("k2", "relay");
        let removed = idx.purge("acl-a");
        assert_eq!(removed, 1);
        assert!(idx.lookup("k1").is_none());
        assert!(idx.lookup("k2").is_some());
    }

    proptest::proptest! {
        #[test]
        fn reconcile_leaves_no_stray_entries(
            keys in proptest::collection::vec("[a-f]{4}", 1..20),
            keep in proptest::collection::vec(0usize..20, 0..10),
        ) {
            let idx = PubkeyIndex::new();
            for k in &keys {
                idx.upsert(k, "acl-a");
            }
            let desired: HashSet<String> = keep
                .into_iter()
                .filter_map(|i| keys.get(i).cloned())
                .collect();
            idx.reconcile("acl-a", &desired);
            for k in &keys {
                let present = idx.lookup(k).is_some();
                prop_assert_eq!(present, desired.contains(k));
            }
        }
    }
}
