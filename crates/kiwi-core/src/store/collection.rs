// ── Ordered reactive entity collection ──
//
// Insertion-ordered storage with O(1) keyed lookups and push-based
// change notification via a `watch` channel.

use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::stream::Snapshot;

/// A reactive collection for a single entity type.
///
/// Order is the order entries were first inserted (for a wholesale
/// replace, the order of the new list). Every mutation rebuilds the
/// snapshot that subscribers receive. The lock is never held across an
/// `.await`.
pub(crate) struct EntityCollection<K, T>
where
    K: Hash + Eq + Clone,
    T: Send + Sync + 'static,
{
    entries: RwLock<IndexMap<K, Arc<T>>>,

    /// Full snapshot, rebuilt on mutation for cheap subscription.
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<K, T> EntityCollection<K, T>
where
    K: Hash + Eq + Clone,
    T: Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            entries: RwLock::new(IndexMap::new()),
            snapshot,
        }
    }

    /// Replace every entry at once. Later duplicates of a key overwrite
    /// earlier ones but keep the earlier position.
    pub(crate) fn replace_all(&self, items: impl IntoIterator<Item = (K, T)>) {
        let fresh: IndexMap<K, Arc<T>> = items
            .into_iter()
            .map(|(key, entity)| (key, Arc::new(entity)))
            .collect();
        self.mutate(|entries| *entries = fresh);
    }

    /// Insert or overwrite. New keys go to the end. Returns the stored entity.
    pub(crate) fn upsert(&self, key: K, entity: T) -> Arc<T> {
        let entity = Arc::new(entity);
        let stored = Arc::clone(&entity);
        self.mutate(move |entries| {
            entries.insert(key, entity);
        });
        stored
    }

    /// Overwrite an existing entry in place. Returns `false` (and changes
    /// nothing) if the key is absent.
    pub(crate) fn replace(&self, key: &K, entity: &Arc<T>) -> bool {
        let mut replaced = false;
        self.mutate(|entries| {
            if let Some(slot) = entries.get_mut(key) {
                *slot = Arc::clone(entity);
                replaced = true;
            }
        });
        replaced
    }

    /// Remove an entry, keeping the order of the rest.
    pub(crate) fn remove(&self, key: &K) -> Option<Arc<T>> {
        let mut removed = None;
        self.mutate(|entries| removed = entries.shift_remove(key));
        removed
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<T>> {
        self.read().get(key).cloned()
    }

    pub(crate) fn clear(&self) {
        self.mutate(IndexMap::clear);
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<K, Arc<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` under the write lock, then broadcast the new snapshot.
    fn mutate(&self, f: impl FnOnce(&mut IndexMap<K, Arc<T>>)) {
        let values: Vec<Arc<T>> = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut entries);
            entries.values().cloned().collect()
        };
        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(col: &EntityCollection<u32, String>) -> Vec<String> {
        col.snapshot().iter().map(|s| (**s).clone()).collect()
    }

    #[test]
    fn upsert_appends_new_keys_in_order() {
        let col = EntityCollection::new();
        col.upsert(2, "b".to_owned());
        col.upsert(1, "a".to_owned());
        assert_eq!(names(&col), ["b", "a"]);
    }

    #[test]
    fn upsert_existing_key_keeps_position() {
        let col = EntityCollection::new();
        col.upsert(1, "a".to_owned());
        col.upsert(2, "b".to_owned());
        col.upsert(1, "a2".to_owned());
        assert_eq!(names(&col), ["a2", "b"]);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn replace_only_touches_present_keys() {
        let col = EntityCollection::new();
        col.upsert(1, "a".to_owned());
        let a2 = Arc::new("a2".to_owned());
        assert!(col.replace(&1, &a2));
        assert!(Arc::ptr_eq(&col.get(&1).unwrap(), &a2));
        assert!(!col.replace(&9, &Arc::new("z".to_owned())));
        assert_eq!(names(&col), ["a2"]);
    }

    #[test]
    fn replace_all_swaps_contents() {
        let col = EntityCollection::new();
        col.upsert(1, "old".to_owned());
        col.replace_all([(3, "c".to_owned()), (4, "d".to_owned())]);
        assert!(col.get(&1).is_none());
        assert_eq!(names(&col), ["c", "d"]);
    }

    #[test]
    fn replace_all_collapses_duplicate_keys() {
        let col = EntityCollection::new();
        col.replace_all([(1, "a".to_owned()), (1, "a2".to_owned())]);
        assert_eq!(col.len(), 1);
        assert_eq!(*col.get(&1).unwrap(), "a2");
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let col = EntityCollection::new();
        col.replace_all([(1, "a".to_owned()), (2, "b".to_owned()), (3, "c".to_owned())]);
        assert_eq!(*col.remove(&2).unwrap(), "b");
        assert!(col.remove(&2).is_none());
        assert_eq!(names(&col), ["a", "c"]);
    }

    #[test]
    fn subscribers_see_mutations() {
        let col = EntityCollection::new();
        let mut rx = col.subscribe();
        col.upsert(1, "a".to_owned());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        col.clear();
        assert!(rx.borrow_and_update().is_empty());
    }
}
