#![forbid(unsafe_code)]

//! Set-multimap diffs over a key → value-set map.
//!
//! Value sets stored in the map are never empty; a key whose last value is
//! removed leaves the map.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::change::SetMultimapElementaryChange;

type Store<K, V> = IndexMap<K, IndexSet<V>>;
type Changes<K, V> = Vec<SetMultimapElementaryChange<K, V>>;

/// Add `value` under `key`.
pub fn put<K, V>(store: &Store<K, V>, key: K, value: V) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    put_all(store, key, [value])
}

/// Add every value not yet present under `key`, as one change.
pub fn put_all<K, V>(store: &Store<K, V>, key: K, values: impl IntoIterator<Item = V>) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    let existing = store.get(&key);
    let mut fresh: IndexSet<V> = IndexSet::new();
    for value in values {
        if !existing.is_some_and(|set| set.contains(&value)) {
            fresh.insert(value);
        }
    }
    if fresh.is_empty() {
        return Vec::new();
    }
    vec![SetMultimapElementaryChange::new(
        key,
        Vec::new(),
        fresh.into_iter().collect(),
    )]
}

/// Remove the single entry `(key, value)`.
pub fn remove<K, V>(store: &Store<K, V>, key: &K, value: &V) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    if !store.get(key).is_some_and(|set| set.contains(value)) {
        return Vec::new();
    }
    vec![SetMultimapElementaryChange::new(
        key.clone(),
        vec![value.clone()],
        Vec::new(),
    )]
}

/// Remove every value under `key`.
pub fn remove_all<K, V>(store: &Store<K, V>, key: &K) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    match store.get(key) {
        Some(values) => vec![SetMultimapElementaryChange::new(
            key.clone(),
            values.iter().cloned().collect(),
            Vec::new(),
        )],
        None => Vec::new(),
    }
}

/// Replace the values under `key`: removes `old \ new`, adds `new \ old`.
pub fn replace_values<K, V>(store: &Store<K, V>, key: K, values: impl IntoIterator<Item = V>) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    let empty = IndexSet::new();
    let old = store.get(&key).unwrap_or(&empty);
    let new: IndexSet<V> = values.into_iter().collect();
    key_transition(key, old, &new).into_iter().collect()
}

/// Remove everything, one change per key in key order.
pub fn clear<K, V>(store: &Store<K, V>) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    store
        .iter()
        .map(|(key, values)| {
            SetMultimapElementaryChange::new(key.clone(), values.iter().cloned().collect(), Vec::new())
        })
        .collect()
}

/// Per-key transition between two multimap values.
pub fn transition<K, V>(old: &Store<K, V>, new: &Store<K, V>) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    let empty = IndexSet::new();
    let mut changes = Vec::new();
    for (key, old_values) in old {
        let new_values = new.get(key).unwrap_or(&empty);
        changes.extend(key_transition(key.clone(), old_values, new_values));
    }
    for (key, new_values) in new {
        if !old.contains_key(key) {
            changes.extend(key_transition(key.clone(), &empty, new_values));
        }
    }
    changes
}

fn key_transition<K, V>(key: K, old: &IndexSet<V>, new: &IndexSet<V>) -> Option<SetMultimapElementaryChange<K, V>>
where
    V: Clone + Eq + Hash,
{
    let removed: Vec<V> = old.difference(new).cloned().collect();
    let added: Vec<V> = new.difference(old).cloned().collect();
    if removed.is_empty() && added.is_empty() {
        return None;
    }
    Some(SetMultimapElementaryChange::new(key, removed, added))
}

/// Apply elementary changes in order.
pub fn apply<K, V>(store: &mut Store<K, V>, changes: &[SetMultimapElementaryChange<K, V>])
where
    K: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    for change in changes {
        let values = store.entry(change.key().clone()).or_default();
        for value in change.values_removed() {
            values.shift_remove(value);
        }
        values.extend(change.values_added().iter().cloned());
        if values.is_empty() {
            store.shift_remove(change.key());
        }
    }
}
