//! C3: a process-wide keyed store with at-most-one-writer-per-key insert
//! semantics and full-scan secondary lookup, as used throughout this crate
//! for both the user and channel registries.
//!
//! Backed by `dashmap`, the same sharded concurrent map the rest of this
//! codebase already reaches for. `set` is built on `DashMap::entry` rather
//! than a check-then-insert, since the latter races under concurrent
//! writers to the same key.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;

#[derive(Debug)]
pub struct Registry<K, V> {
    inner: DashMap<K, V>,
}

impl<K, V> Default for Registry<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Registry {
            inner: DashMap::new(),
        }
    }

    /// Insert only if `key` is absent. Never overwrites.
    pub fn set(&self, key: K, value: V) -> bool {
        match self.inner.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Insert, overwriting any existing value.
    pub fn update(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Remove `key`; returns true iff it was present.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn dump(&self) -> Vec<(K, V)> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn flush(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Apply `f` to the value at `key` in place; returns false if absent.
    pub fn alter(&self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        match self.inner.get_mut(key) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Apply `f` to the value at `key`, inserting `default()` first if
    /// absent. Returns the value after mutation.
    pub fn alter_or_insert(&self, key: K, default: impl FnOnce() -> V, f: impl FnOnce(&mut V)) -> V {
        let mut entry = self.inner.entry(key).or_insert_with(default);
        f(entry.value_mut());
        entry.value().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_never_overwrites() {
        let r: Registry<&str, i32> = Registry::new();
        assert!(r.set("a", 1));
        assert!(!r.set("a", 2));
        assert_eq!(r.get(&"a"), Some(1));
    }

    #[test]
    fn update_always_wins() {
        let r: Registry<&str, i32> = Registry::new();
        r.update("a", 1);
        r.update("a", 2);
        assert_eq!(r.get(&"a"), Some(2));
    }

    #[test]
    fn drop_then_get_is_none() {
        let r: Registry<&str, i32> = Registry::new();
        assert!(!r.remove(&"a"));
        r.update("a", 1);
        assert!(r.remove(&"a"));
        assert_eq!(r.get(&"a"), None);
    }

    #[test]
    fn flush_clears_everything() {
        let r: Registry<&str, i32> = Registry::new();
        r.update("a", 1);
        r.update("b", 2);
        r.flush();
        assert!(r.is_empty());
    }
}
