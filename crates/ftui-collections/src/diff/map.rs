#![forbid(unsafe_code)]

//! Map diffs over insertion-ordered maps.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::change::MapElementaryChange;

type Changes<K, V> = Vec<MapElementaryChange<K, V>>;

/// Associate `value` with `key`. Re-putting an equal value is a no-op.
pub fn put<K, V>(map: &IndexMap<K, V>, key: K, value: V) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    match map.get(&key) {
        Some(old) if *old == value => Vec::new(),
        Some(old) => vec![MapElementaryChange::replaced(key, old.clone(), value)],
        None => vec![MapElementaryChange::added(key, value)],
    }
}

/// Put several entries; for repeated keys the last value wins.
pub fn put_all<K, V>(map: &IndexMap<K, V>, entries: impl IntoIterator<Item = (K, V)>) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    let merged: IndexMap<K, V> = entries.into_iter().collect();
    merged
        .into_iter()
        .flat_map(|(key, value)| put(map, key, value))
        .collect()
}

/// Remove the entry for `key`, if any.
pub fn remove<K, V>(map: &IndexMap<K, V>, key: &K) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    map.get(key)
        .map(|value| MapElementaryChange::removed(key.clone(), value.clone()))
        .into_iter()
        .collect()
}

/// Remove every entry matching `predicate`, in map order.
pub fn remove_where<K, V>(map: &IndexMap<K, V>, mut predicate: impl FnMut(&K, &V) -> bool) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    map.iter()
        .filter(|(k, v)| predicate(k, v))
        .map(|(k, v)| MapElementaryChange::removed(k.clone(), v.clone()))
        .collect()
}

/// Remove the entries whose key is in `keys`.
pub fn remove_keys<K, V>(map: &IndexMap<K, V>, keys: &[K]) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    let targets: IndexSet<&K> = keys.iter().collect();
    remove_where(map, |k, _| targets.contains(k))
}

/// Minimal transition between two map values: per old key a removal or
/// replacement, then additions for new keys.
pub fn transition<K, V>(old: &IndexMap<K, V>, new: &IndexMap<K, V>) -> Changes<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone + PartialEq,
{
    let mut changes = Vec::new();
    for (key, old_value) in old {
        match new.get(key) {
            Some(new_value) if new_value == old_value => {}
            Some(new_value) => changes.push(MapElementaryChange::replaced(
                key.clone(),
                old_value.clone(),
                new_value.clone(),
            )),
            None => changes.push(MapElementaryChange::removed(key.clone(), old_value.clone())),
        }
    }
    for (key, value) in new {
        if !old.contains_key(key) {
            changes.push(MapElementaryChange::added(key.clone(), value.clone()));
        }
    }
    changes
}

/// Apply elementary changes in order.
pub fn apply<K, V>(map: &mut IndexMap<K, V>, changes: &[MapElementaryChange<K, V>])
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    for change in changes {
        match change.value_added() {
            Some(value) => {
                map.insert(change.key().clone(), value.clone());
            }
            None => {
                map.shift_remove(change.key());
            }
        }
    }
}
