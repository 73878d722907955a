#![forbid(unsafe_code)]

//! Observable set-multimap: each key maps to a non-empty set of values.
//!
//! `len()` counts `(key, value)` entries; [`ObservableSetMultimap::key_count`]
//! counts distinct keys.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use super::{ChangeListener, InvalidationListener, Notifier, ObservableCollection};
use crate::change::{SetMultimapChange, SetMultimapElementaryChange};
use crate::config::DispatchConfig;
use crate::diff;
use crate::error::{CollectionError, CollectionResult};

/// Listener type for set-multimap changes.
pub type SetMultimapChangeListener<K, V> = ChangeListener<SetMultimapChange<K, V>>;

type Store<K, V> = IndexMap<K, IndexSet<V>>;

struct MultimapInner<K, V> {
    store: RefCell<Store<K, V>>,
    notifier: Notifier<ObservableSetMultimap<K, V>, SetMultimapChange<K, V>>,
}

/// A shared, observable set-multimap.
pub struct ObservableSetMultimap<K, V> {
    inner: Rc<MultimapInner<K, V>>,
    read_only: bool,
}

impl<K, V> Clone for ObservableSetMultimap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: self.read_only,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableSetMultimap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSetMultimap")
            .field("store", &self.inner.store.borrow())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl<K, V> Default for ObservableSetMultimap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + Eq + Hash + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ObservableSetMultimap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + Eq + Hash + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_config(iter, &DispatchConfig::default())
    }
}

impl<K, V> ObservableSetMultimap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + Eq + Hash + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(std::iter::empty(), &DispatchConfig::default())
    }

    /// Wrap existing entries using `config`.
    #[must_use]
    pub fn with_config(entries: impl IntoIterator<Item = (K, V)>, config: &DispatchConfig) -> Self {
        let mut store: Store<K, V> = IndexMap::new();
        for (key, value) in entries {
            store.entry(key).or_default().insert(value);
        }
        Self {
            inner: Rc::new(MultimapInner {
                store: RefCell::new(store),
                notifier: Notifier::new(config),
            }),
            read_only: false,
        }
    }

    /// A read-only view sharing contents and listeners.
    #[must_use]
    pub fn unmodifiable(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: true,
        }
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of `(key, value)` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.store.borrow().values().map(IndexSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.store.borrow().is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.inner.store.borrow().len()
    }

    /// Values under `key` (empty when absent).
    #[must_use]
    pub fn get(&self, key: &K) -> Vec<V> {
        self.inner
            .store
            .borrow()
            .get(key)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.store.borrow().contains_key(key)
    }

    #[must_use]
    pub fn contains_entry(&self, key: &K, value: &V) -> bool {
        self.inner
            .store
            .borrow()
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner
            .store
            .borrow()
            .values()
            .any(|values| values.contains(value))
    }

    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.store.borrow().keys().cloned().collect()
    }

    /// Every `(key, value)` entry, grouped by key.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.inner
            .store
            .borrow()
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.clone(), v.clone())))
            .collect()
    }

    /// Add `(key, value)`; `false` if the entry was already present.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn put(&self, key: K, value: V) -> CollectionResult<bool> {
        self.mutate(|store| diff::multimap::put(store, key, value))
    }

    /// Add every value under `key`, as one change.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn put_all(&self, key: K, values: impl IntoIterator<Item = V>) -> CollectionResult<bool> {
        self.mutate(|store| diff::multimap::put_all(store, key, values))
    }

    /// Remove the single entry `(key, value)`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove(&self, key: &K, value: &V) -> CollectionResult<bool> {
        self.mutate(|store| diff::multimap::remove(store, key, value))
    }

    /// Remove every value under `key`, returning them.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove_all(&self, key: &K) -> CollectionResult<Vec<V>> {
        self.check_writable()?;
        let previous = self.get(key);
        self.mutate(|store| diff::multimap::remove_all(store, key))?;
        Ok(previous)
    }

    /// Replace the values under `key`, returning the previous ones. Only the
    /// difference is reported.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn replace_values(&self, key: K, values: impl IntoIterator<Item = V>) -> CollectionResult<Vec<V>> {
        self.check_writable()?;
        let previous = self.get(&key);
        self.mutate(|store| diff::multimap::replace_values(store, key, values))?;
        Ok(previous)
    }

    /// Remove everything, one elementary change per key.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn clear(&self) -> CollectionResult<bool> {
        self.mutate(diff::multimap::clear)
    }

    pub fn add_listener(&self, listener: SetMultimapChangeListener<K, V>) {
        self.inner.notifier.add_change(listener);
    }

    pub fn remove_listener(&self, listener: &SetMultimapChangeListener<K, V>) -> bool {
        self.inner.notifier.remove_change(listener)
    }

    pub fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        self.inner.notifier.add_invalidation(listener);
    }

    pub fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        self.inner.notifier.remove_invalidation(listener)
    }

    fn check_writable(&self) -> CollectionResult<()> {
        if self.read_only {
            return Err(CollectionError::ReadOnly);
        }
        Ok(())
    }

    fn mutate(
        &self,
        compute: impl FnOnce(&Store<K, V>) -> Vec<SetMultimapElementaryChange<K, V>>,
    ) -> CollectionResult<bool> {
        self.check_writable()?;
        let changes = compute(&self.inner.store.borrow());
        Ok(self.commit(changes))
    }

    fn commit(&self, changes: Vec<SetMultimapElementaryChange<K, V>>) -> bool {
        if changes.is_empty() {
            return false;
        }
        diff::multimap::apply(&mut self.inner.store.borrow_mut(), &changes);
        let mut change = SetMultimapChange::new(changes);
        self.inner.notifier.fire(self, &mut change);
        true
    }
}

impl<K, V> ObservableCollection for ObservableSetMultimap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + Eq + Hash + 'static,
{
    type Change = SetMultimapChange<K, V>;

    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other) && self.read_only == other.read_only
    }

    fn len(&self) -> usize {
        ObservableSetMultimap::len(self)
    }

    fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        ObservableSetMultimap::add_invalidation_listener(self, listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        ObservableSetMultimap::remove_invalidation_listener(self, listener)
    }

    fn add_change_listener(&self, listener: ChangeListener<Self::Change>) {
        self.add_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeListener<Self::Change>) -> bool {
        self.remove_listener(listener)
    }

    fn transition(old: Option<&Self>, new: Option<&Self>) -> Option<Self::Change> {
        let snapshot = |multimap: Option<&Self>| {
            multimap
                .map(|m| m.inner.store.borrow().clone())
                .unwrap_or_default()
        };
        let changes = diff::multimap::transition(&snapshot(old), &snapshot(new));
        (!changes.is_empty()).then(|| SetMultimapChange::new(changes))
    }

    fn replay(&self, change: &Self::Change) -> CollectionResult<()> {
        for elementary in change.elementary_changes() {
            let key = elementary.key();
            for value in elementary.values_removed() {
                self.remove(key, value)?;
            }
            if !elementary.values_added().is_empty() {
                self.put_all(key.clone(), elementary.values_added().iter().cloned())?;
            }
        }
        Ok(())
    }

    fn assign_from(&self, source: Option<&Self>) -> CollectionResult<bool> {
        self.check_writable()?;
        let target = source
            .map(|m| m.inner.store.borrow().clone())
            .unwrap_or_default();
        self.mutate(|current| diff::multimap::transition(current, &target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Multimap = ObservableSetMultimap<i32, &'static str>;

    fn recorder(multimap: &Multimap) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        multimap.add_listener(Rc::new(move |change: &mut SetMultimapChange<i32, &'static str>| {
            while change.next() {
                log_clone.borrow_mut().push(change.current().unwrap().to_string());
            }
        }));
        log
    }

    #[test]
    fn sizes_count_entries_and_keys() {
        let multimap: Multimap = [(1, "a"), (1, "b"), (2, "c"), (1, "a")].into_iter().collect();
        assert_eq!(multimap.len(), 3);
        assert_eq!(multimap.key_count(), 2);
        assert!(multimap.contains_entry(&1, &"b"));
        assert!(multimap.contains_value(&"c"));
        assert_eq!(multimap.get(&9), Vec::<&str>::new());
    }

    #[test]
    fn put_existing_entry_is_noop() {
        let multimap: Multimap = [(1, "a")].into_iter().collect();
        let log = recorder(&multimap);
        assert_eq!(multimap.put(1, "a"), Ok(false));
        assert!(log.borrow().is_empty());
        assert_eq!(multimap.put(1, "b"), Ok(true));
        assert_eq!(*log.borrow(), vec!["Added [\"b\"] for key 1."]);
    }

    #[test]
    fn removing_last_value_drops_key() {
        let multimap: Multimap = [(1, "a")].into_iter().collect();
        assert_eq!(multimap.remove(&1, &"a"), Ok(true));
        assert!(!multimap.contains_key(&1));
        assert!(multimap.is_empty());
    }

    #[test]
    fn remove_all_returns_values() {
        let multimap: Multimap = [(1, "a"), (1, "b")].into_iter().collect();
        let log = recorder(&multimap);
        assert_eq!(multimap.remove_all(&1), Ok(vec!["a", "b"]));
        assert_eq!(*log.borrow(), vec!["Removed [\"a\", \"b\"] for key 1."]);
        assert_eq!(multimap.remove_all(&1), Ok(vec![]));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn clear_fires_one_change_per_key() {
        let multimap: Multimap = [(1, "a"), (2, "b")].into_iter().collect();
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sizes_clone = Rc::clone(&sizes);
        multimap.add_listener(Rc::new(move |change: &mut SetMultimapChange<i32, &'static str>| {
            sizes_clone.borrow_mut().push(change.len());
        }));
        multimap.clear().unwrap();
        assert_eq!(*sizes.borrow(), vec![2]);
    }

    #[test]
    fn read_only_view() {
        let multimap: Multimap = Multimap::new();
        assert_eq!(
            multimap.unmodifiable().put(1, "a"),
            Err(CollectionError::ReadOnly)
        );
    }
}
