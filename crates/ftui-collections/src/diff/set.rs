#![forbid(unsafe_code)]

//! Set diffs over insertion-ordered sets.

use std::hash::Hash;

use indexmap::IndexSet;

use crate::change::SetElementaryChange;

type Changes<E> = Vec<SetElementaryChange<E>>;

/// Add each element not already present (duplicates in `items` count once).
pub fn add_all<E: Clone + Eq + Hash>(set: &IndexSet<E>, items: impl IntoIterator<Item = E>) -> Changes<E> {
    let mut fresh: IndexSet<E> = IndexSet::new();
    for item in items {
        if !set.contains(&item) {
            fresh.insert(item);
        }
    }
    fresh.into_iter().map(SetElementaryChange::Added).collect()
}

/// Remove every element matching `predicate`, in set order.
pub fn remove_where<E: Clone + Eq + Hash>(
    set: &IndexSet<E>,
    mut predicate: impl FnMut(&E) -> bool,
) -> Changes<E> {
    set.iter()
        .filter(|e| predicate(e))
        .cloned()
        .map(SetElementaryChange::Removed)
        .collect()
}

/// Remove the elements of `items` that are present.
pub fn remove_all<E: Clone + Eq + Hash>(set: &IndexSet<E>, items: &[E]) -> Changes<E> {
    let targets: IndexSet<&E> = items.iter().collect();
    remove_where(set, |e| targets.contains(e))
}

/// Keep only elements contained in `items`.
pub fn retain_all<E: Clone + Eq + Hash>(set: &IndexSet<E>, items: &[E]) -> Changes<E> {
    let keep: IndexSet<&E> = items.iter().collect();
    remove_where(set, |e| !keep.contains(e))
}

/// Minimal transition between two set values: removals first, then
/// additions.
pub fn transition<E: Clone + Eq + Hash>(old: &IndexSet<E>, new: &IndexSet<E>) -> Changes<E> {
    let removed = old
        .iter()
        .filter(|e| !new.contains(*e))
        .cloned()
        .map(SetElementaryChange::Removed);
    let added = new
        .iter()
        .filter(|e| !old.contains(*e))
        .cloned()
        .map(SetElementaryChange::Added);
    removed.chain(added).collect()
}

/// Apply elementary changes in order.
pub fn apply<E: Clone + Eq + Hash>(set: &mut IndexSet<E>, changes: &[SetElementaryChange<E>]) {
    for change in changes {
        match change {
            SetElementaryChange::Added(e) => {
                set.insert(e.clone());
            }
            SetElementaryChange::Removed(e) => {
                set.shift_remove(e);
            }
        }
    }
}
