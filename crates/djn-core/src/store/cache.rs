// ── Whole-snapshot cache ──
//
// Readers load the currently published snapshot through `ArcSwap`; a
// refresh builds the next one off to the side and swaps it in with a
// single store. There is no partial-update operation.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tracing::debug;

use super::Snapshot;
use crate::model::Resource;

/// One published generation: the id index and the list view share records.
struct Published<T> {
    by_id: IndexMap<String, Arc<T>>,
    list: Snapshot<T>,
}

impl<T> Published<T> {
    fn empty() -> Self {
        Self {
            by_id: IndexMap::new(),
            list: Arc::new(Vec::new()),
        }
    }
}

/// The last known-good collection of one resource kind.
pub struct SnapshotCache<T: Resource> {
    current: ArcSwap<Published<T>>,
}

impl<T: Resource> SnapshotCache<T> {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Published::empty()),
        }
    }

    /// Replace the entire contents with `records` and return the newly
    /// published snapshot.
    ///
    /// Records keep their incoming order. If two records share an id, the
    /// later one wins and keeps the earlier one's position.
    pub fn replace_all(&self, records: Vec<T>) -> Snapshot<T> {
        let mut by_id: IndexMap<String, Arc<T>> = IndexMap::with_capacity(records.len());
        for record in records {
            let id = record.resource_id().to_owned();
            if by_id.insert(id, Arc::new(record)).is_some() {
                debug!(kind = T::KIND, "duplicate identifier in fetched snapshot");
            }
        }

        let list: Snapshot<T> = Arc::new(by_id.values().cloned().collect());
        self.current.store(Arc::new(Published {
            by_id,
            list: Arc::clone(&list),
        }));
        list
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn list(&self) -> Snapshot<T> {
        Arc::clone(&self.current.load().list)
    }

    pub fn count(&self) -> usize {
        self.current.load().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.current.load().by_id.get(id).cloned()
    }
}

impl<T: Resource> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        id: &'static str,
        value: u32,
    }

    impl Resource for Rec {
        const KIND: &'static str = "record";
        const PLURAL: &'static str = "records";

        fn resource_id(&self) -> &str {
            self.id
        }
    }

    fn rec(id: &'static str, value: u32) -> Rec {
        Rec { id, value }
    }

    #[test]
    fn starts_empty() {
        let cache = SnapshotCache::<Rec>::new();
        assert!(cache.is_empty());
        assert!(cache.list().is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn replace_all_swaps_everything() {
        let cache = SnapshotCache::new();
        cache.replace_all(vec![rec("a", 1), rec("b", 2)]);
        cache.replace_all(vec![rec("c", 3)]);

        assert_eq!(cache.count(), 1);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("c").unwrap().value, 3);
        let ids: Vec<_> = cache.list().iter().map(|r| r.id).collect();
        assert_eq!(ids, ["c"]);
    }

    #[test]
    fn held_snapshot_is_unaffected_by_later_replace() {
        let cache = SnapshotCache::new();
        cache.replace_all(vec![rec("a", 1), rec("b", 2)]);
        let before = cache.list();

        cache.replace_all(vec![rec("z", 26)]);

        assert_eq!(before.len(), 2);
        assert_eq!(before[0].id, "a");
        assert_eq!(cache.list().len(), 1);
    }

    #[test]
    fn duplicate_ids_keep_last_record() {
        let cache = SnapshotCache::new();
        let snap = cache.replace_all(vec![rec("a", 1), rec("b", 2), rec("a", 3)]);

        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].value, 3);
        assert_eq!(cache.get("a").unwrap().value, 3);
    }
}
