#![forbid(unsafe_code)]

//! Observable key → value map with insertion-ordered iteration.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{ChangeListener, InvalidationListener, Notifier, ObservableCollection};
use crate::change::{MapChange, MapElementaryChange};
use crate::config::DispatchConfig;
use crate::diff;
use crate::error::{CollectionError, CollectionResult};

/// Listener type for map changes.
pub type MapChangeListener<K, V> = ChangeListener<MapChange<K, V>>;

struct MapInner<K, V> {
    entries: RefCell<IndexMap<K, V>>,
    notifier: Notifier<ObservableMap<K, V>, MapChange<K, V>>,
}

/// A shared, observable map.
pub struct ObservableMap<K, V> {
    inner: Rc<MapInner<K, V>>,
    read_only: bool,
}

impl<K, V> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: self.read_only,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMap")
            .field("entries", &self.inner.entries.borrow())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl<K, V> Default for ObservableMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for ObservableMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_config(iter, &DispatchConfig::default())
    }
}

impl<K, V> ObservableMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(std::iter::empty(), &DispatchConfig::default())
    }

    /// Wrap existing entries (later duplicates win) using `config`.
    #[must_use]
    pub fn with_config(entries: impl IntoIterator<Item = (K, V)>, config: &DispatchConfig) -> Self {
        Self {
            inner: Rc::new(MapInner {
                entries: RefCell::new(entries.into_iter().collect()),
                notifier: Notifier::new(config),
            }),
            read_only: false,
        }
    }

    /// A read-only view sharing entries and listeners.
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

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner.entries.borrow().values().any(|v| v == value)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.inner.entries.borrow().values().cloned().collect()
    }

    /// Snapshot of all entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn with<R>(&self, f: impl FnOnce(&IndexMap<K, V>) -> R) -> R {
        f(&self.inner.entries.borrow())
    }

    /// Associate `value` with `key`, returning the previous value.
    /// Re-putting an equal value fires nothing.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn put(&self, key: K, value: V) -> CollectionResult<Option<V>> {
        self.check_writable()?;
        let previous = self.get(&key);
        self.mutate(|entries| diff::map::put(entries, key, value))?;
        Ok(previous)
    }

    /// Put every entry as one change; for repeated keys the last value wins.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> CollectionResult<bool> {
        self.mutate(|current| diff::map::put_all(current, entries))
    }

    /// Remove the entry for `key`, returning its value.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove(&self, key: &K) -> CollectionResult<Option<V>> {
        self.check_writable()?;
        let previous = self.get(key);
        self.mutate(|entries| diff::map::remove(entries, key))?;
        Ok(previous)
    }

    /// Remove every entry whose key is in `keys`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove_keys(&self, keys: &[K]) -> CollectionResult<bool> {
        self.mutate(|entries| diff::map::remove_keys(entries, keys))
    }

    /// Keep only entries for which `keep` returns `true`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn retain(&self, mut keep: impl FnMut(&K, &V) -> bool) -> CollectionResult<bool> {
        self.mutate(|entries| diff::map::remove_where(entries, |k, v| !keep(k, v)))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn clear(&self) -> CollectionResult<bool> {
        self.mutate(|entries| diff::map::remove_where(entries, |_, _| true))
    }

    pub fn add_listener(&self, listener: MapChangeListener<K, V>) {
        self.inner.notifier.add_change(listener);
    }

    pub fn remove_listener(&self, listener: &MapChangeListener<K, V>) -> bool {
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
        compute: impl FnOnce(&IndexMap<K, V>) -> Vec<MapElementaryChange<K, V>>,
    ) -> CollectionResult<bool> {
        self.check_writable()?;
        let changes = compute(&self.inner.entries.borrow());
        Ok(self.commit(changes))
    }

    fn commit(&self, changes: Vec<MapElementaryChange<K, V>>) -> bool {
        if changes.is_empty() {
            return false;
        }
        diff::map::apply(&mut self.inner.entries.borrow_mut(), &changes);
        let mut change = MapChange::new(changes);
        self.inner.notifier.fire(self, &mut change);
        true
    }
}

impl<K, V> ObservableCollection for ObservableMap<K, V>
where
    K: Clone + Eq + Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    type Change = MapChange<K, V>;

    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other) && self.read_only == other.read_only
    }

    fn len(&self) -> usize {
        ObservableMap::len(self)
    }

    fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        ObservableMap::add_invalidation_listener(self, listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        ObservableMap::remove_invalidation_listener(self, listener)
    }

    fn add_change_listener(&self, listener: ChangeListener<Self::Change>) {
        self.add_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeListener<Self::Change>) -> bool {
        self.remove_listener(listener)
    }

    fn transition(old: Option<&Self>, new: Option<&Self>) -> Option<Self::Change> {
        let snapshot = |map: Option<&Self>| {
            map.map(|m| m.inner.entries.borrow().clone())
                .unwrap_or_default()
        };
        let changes = diff::map::transition(&snapshot(old), &snapshot(new));
        (!changes.is_empty()).then(|| MapChange::new(changes))
    }

    fn replay(&self, change: &Self::Change) -> CollectionResult<()> {
        for elementary in change.elementary_changes() {
            match elementary.value_added() {
                Some(value) => self.put(elementary.key().clone(), value.clone())?,
                None => self.remove(elementary.key())?,
            };
        }
        Ok(())
    }

    fn assign_from(&self, source: Option<&Self>) -> CollectionResult<bool> {
        self.check_writable()?;
        let target = source
            .map(|m| m.inner.entries.borrow().clone())
            .unwrap_or_default();
        self.mutate(|current| diff::map::transition(current, &target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Map = ObservableMap<&'static str, i32>;

    fn recorder(map: &Map) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        map.add_listener(Rc::new(move |change: &mut MapChange<&'static str, i32>| {
            while change.next() {
                log_clone.borrow_mut().push(change.current().unwrap().to_string());
            }
        }));
        log
    }

    #[test]
    fn put_returns_previous_value() {
        let map = Map::new();
        let log = recorder(&map);
        assert_eq!(map.put("a", 1), Ok(None));
        assert_eq!(map.put("a", 1), Ok(Some(1)));
        assert_eq!(map.put("a", 2), Ok(Some(1)));
        assert_eq!(
            *log.borrow(),
            vec!["Added 1 for key \"a\".", "Replaced 1 by 2 for key \"a\"."]
        );
    }

    #[test]
    fn remove_absent_key_fires_nothing() {
        let map: Map = [("a", 1)].into_iter().collect();
        let log = recorder(&map);
        assert_eq!(map.remove(&"z"), Ok(None));
        assert!(log.borrow().is_empty());
        assert_eq!(map.remove(&"a"), Ok(Some(1)));
        assert_eq!(*log.borrow(), vec!["Removed 1 for key \"a\"."]);
    }

    #[test]
    fn put_all_is_one_notification() {
        let map = Map::new();
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = Rc::clone(&calls);
        map.add_listener(Rc::new(move |change: &mut MapChange<&'static str, i32>| {
            *calls_clone.borrow_mut() += 1;
            assert_eq!(change.len(), 2);
        }));
        map.put_all([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(map.entries(), vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn retain_and_queries() {
        let map: Map = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        map.retain(|_, v| *v != 2).unwrap();
        assert_eq!(map.keys(), vec!["a", "c"]);
        assert!(map.contains_value(&3));
        assert!(!map.contains_key(&"b"));
        map.clear().unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn replay_applies_each_elementary_change() {
        let source: Map = [("a", 1), ("b", 2)].into_iter().collect();
        let mirror: Map = [("a", 1), ("b", 2)].into_iter().collect();
        let captured = Rc::new(RefCell::new(None));
        let captured_clone = Rc::clone(&captured);
        source.add_listener(Rc::new(move |change: &mut MapChange<&'static str, i32>| {
            *captured_clone.borrow_mut() = Some(change.clone());
        }));
        source.put_all([("a", 5), ("c", 3)]).unwrap();
        source.remove(&"b").unwrap();
        let change = captured.borrow_mut().take().unwrap();
        mirror.put_all([("a", 5), ("c", 3)]).unwrap();
        mirror.replay(&change).unwrap();
        assert_eq!(mirror.entries(), source.entries());
    }

    #[test]
    fn read_only_view() {
        let map: Map = Map::new();
        assert_eq!(map.unmodifiable().put("a", 1), Err(CollectionError::ReadOnly));
    }
}
