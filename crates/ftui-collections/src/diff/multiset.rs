#![forbid(unsafe_code)]

//! Multiset diffs over an element → count map.
//!
//! Counts stored in the map are always positive; an element whose count
//! drops to zero leaves the map.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::change::MultisetElementaryChange;
use crate::error::{CollectionError, CollectionResult};

type Counts<E> = IndexMap<E, usize>;
type Changes<E> = Vec<MultisetElementaryChange<E>>;

fn count_of<E: Eq + Hash>(counts: &Counts<E>, element: &E) -> usize {
    counts.get(element).copied().unwrap_or(0)
}

fn checked_total<E: Eq + Hash>(
    counts: &Counts<E>,
    element: &E,
    occurrences: usize,
) -> CollectionResult<usize> {
    let count = count_of(counts, element);
    count
        .checked_add(occurrences)
        .ok_or(CollectionError::CountOverflow { count, occurrences })
}

/// Add `occurrences` of `element`.
///
/// # Errors
///
/// [`CollectionError::CountOverflow`] when the resulting count would not
/// fit in a `usize`.
pub fn add<E: Clone + Eq + Hash>(
    counts: &Counts<E>,
    element: E,
    occurrences: usize,
) -> CollectionResult<Changes<E>> {
    if occurrences == 0 {
        return Ok(Vec::new());
    }
    checked_total(counts, &element, occurrences)?;
    Ok(vec![MultisetElementaryChange::added(element, occurrences)])
}

/// Remove up to `occurrences` of `element`.
pub fn remove<E: Clone + Eq + Hash>(counts: &Counts<E>, element: &E, occurrences: usize) -> Changes<E> {
    let removed = occurrences.min(count_of(counts, element));
    if removed == 0 {
        return Vec::new();
    }
    vec![MultisetElementaryChange::removed(element.clone(), removed)]
}

/// Set the count of `element` to `count`.
pub fn set_count<E: Clone + Eq + Hash>(counts: &Counts<E>, element: E, count: usize) -> Changes<E> {
    let current = count_of(counts, &element);
    if count > current {
        vec![MultisetElementaryChange::added(element, count - current)]
    } else if count < current {
        vec![MultisetElementaryChange::removed(element, current - count)]
    } else {
        Vec::new()
    }
}

/// Compare-and-set: only when the live count equals `expected`.
pub fn set_count_if<E: Clone + Eq + Hash>(
    counts: &Counts<E>,
    element: E,
    expected: usize,
    count: usize,
) -> Changes<E> {
    if count_of(counts, &element) != expected {
        return Vec::new();
    }
    set_count(counts, element, count)
}

/// Add one occurrence per item, coalesced per distinct element in
/// first-seen order.
///
/// # Errors
///
/// [`CollectionError::CountOverflow`] when any resulting count would not
/// fit in a `usize`. Nothing is reported in that case.
pub fn add_all<E: Clone + Eq + Hash>(
    counts: &Counts<E>,
    items: impl IntoIterator<Item = E>,
) -> CollectionResult<Changes<E>> {
    let mut batch: Counts<E> = IndexMap::new();
    for item in items {
        let n = batch.entry(item).or_insert(0);
        *n = n.saturating_add(1);
    }
    batch
        .into_iter()
        .map(|(element, n)| {
            checked_total(counts, &element, n)?;
            Ok(MultisetElementaryChange::added(element, n))
        })
        .collect()
}

/// Remove all occurrences of every element matching `predicate`.
pub fn remove_where<E: Clone + Eq + Hash>(counts: &Counts<E>, mut predicate: impl FnMut(&E) -> bool) -> Changes<E> {
    counts
        .iter()
        .filter(|(e, _)| predicate(e))
        .map(|(e, &n)| MultisetElementaryChange::removed(e.clone(), n))
        .collect()
}

/// Remove all occurrences of elements in `items`, however often they
/// appear there.
pub fn remove_all<E: Clone + Eq + Hash>(counts: &Counts<E>, items: &[E]) -> Changes<E> {
    let targets: IndexSet<&E> = items.iter().collect();
    remove_where(counts, |e| targets.contains(e))
}

/// Remove all occurrences of elements not in `items`.
pub fn retain_all<E: Clone + Eq + Hash>(counts: &Counts<E>, items: &[E]) -> Changes<E> {
    let keep: IndexSet<&E> = items.iter().collect();
    remove_where(counts, |e| !keep.contains(e))
}

/// Minimal per-element count transition between two multiset values.
pub fn transition<E: Clone + Eq + Hash>(old: &Counts<E>, new: &Counts<E>) -> Changes<E> {
    let mut changes = Vec::new();
    for element in old.keys() {
        changes.extend(set_count(old, element.clone(), count_of(new, element)));
    }
    for (element, &new_count) in new {
        if !old.contains_key(element) {
            changes.push(MultisetElementaryChange::added(element.clone(), new_count));
        }
    }
    changes
}

/// Apply elementary changes in order.
pub fn apply<E: Clone + Eq + Hash>(counts: &mut Counts<E>, changes: &[MultisetElementaryChange<E>]) {
    for change in changes {
        let current = count_of(counts, change.element());
        let next = current
            .saturating_add(change.add_count())
            .saturating_sub(change.remove_count());
        if next == 0 {
            counts.shift_remove(change.element());
        } else {
            counts.insert(change.element().clone(), next);
        }
    }
}
