#![forbid(unsafe_code)]

//! List diffs.

use std::cmp::Ordering;

use crate::change::ListElementaryChange;
use crate::error::{CollectionError, CollectionResult};

type Changes<E> = Vec<ListElementaryChange<E>>;

/// Insert `items` before `index` (`index == len` appends).
///
/// # Errors
///
/// Returns [`CollectionError::IndexOutOfBounds`] when `index > len`.
pub fn insert<E: Clone>(list: &[E], index: usize, items: Vec<E>) -> CollectionResult<Changes<E>> {
    if index > list.len() {
        return Err(CollectionError::IndexOutOfBounds {
            index,
            len: list.len(),
        });
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![ListElementaryChange::add(index, items)])
}

/// Replace `list[from..to]` by `items` as one elementary change.
///
/// # Errors
///
/// Returns [`CollectionError::InvalidRange`] for a reversed or overlong range.
pub fn replace_range<E: Clone + PartialEq>(
    list: &[E],
    from: usize,
    to: usize,
    items: Vec<E>,
) -> CollectionResult<Changes<E>> {
    if from > to || to > list.len() {
        return Err(CollectionError::InvalidRange {
            from,
            to,
            len: list.len(),
        });
    }
    let removed = &list[from..to];
    if removed == items.as_slice() {
        return Ok(Vec::new());
    }
    Ok(vec![ListElementaryChange::replace(
        from,
        removed.to_vec(),
        items,
    )])
}

/// Remove `list[from..to]`.
///
/// # Errors
///
/// Returns [`CollectionError::InvalidRange`] for a reversed or overlong range.
pub fn remove_range<E: Clone + PartialEq>(
    list: &[E],
    from: usize,
    to: usize,
) -> CollectionResult<Changes<E>> {
    replace_range(list, from, to, Vec::new())
}

/// Overwrite the element at `index`. Equal values are a no-op.
///
/// # Errors
///
/// Returns [`CollectionError::IndexOutOfBounds`] when `index >= len`.
pub fn set<E: Clone + PartialEq>(list: &[E], index: usize, item: E) -> CollectionResult<Changes<E>> {
    if index >= list.len() {
        return Err(CollectionError::IndexOutOfBounds {
            index,
            len: list.len(),
        });
    }
    replace_range(list, index, index + 1, vec![item])
}

/// Replace the whole contents. Content-equal input is a no-op; otherwise a
/// single change spans the full range.
pub fn set_all<E: Clone + PartialEq>(list: &[E], items: Vec<E>) -> Changes<E> {
    if list == items.as_slice() {
        return Vec::new();
    }
    vec![ListElementaryChange::replace(0, list.to_vec(), items)]
}

/// Full transition between two list values of a property.
///
/// Unlike [`set_all`], content-equal non-empty lists still produce a full
/// replace: the property now references a different list.
pub fn transition<E: Clone>(old: &[E], new: &[E]) -> Changes<E> {
    if old.is_empty() && new.is_empty() {
        return Vec::new();
    }
    vec![ListElementaryChange::replace(0, old.to_vec(), new.to_vec())]
}

/// Remove every element matching `predicate`, one change per maximal run.
///
/// `predicate` is evaluated exactly once per element, in order.
pub fn remove_where<E: Clone>(list: &[E], predicate: impl FnMut(&E) -> bool) -> Changes<E> {
    let mask: Vec<bool> = list.iter().map(predicate).collect();
    let mut changes = Vec::new();
    let mut removed_so_far = 0;
    let mut index = 0;
    while index < list.len() {
        if !mask[index] {
            index += 1;
            continue;
        }
        let start = index;
        while index < list.len() && mask[index] {
            index += 1;
        }
        let run = list[start..index].to_vec();
        let run_len = run.len();
        changes.push(ListElementaryChange::remove(start - removed_so_far, run));
        removed_so_far += run_len;
    }
    changes
}

/// Remove every occurrence of every element of `items`.
pub fn remove_all<E: Clone + PartialEq>(list: &[E], items: &[E]) -> Changes<E> {
    remove_where(list, |e| items.contains(e))
}

/// Keep only elements contained in `items`.
pub fn retain_all<E: Clone + PartialEq>(list: &[E], items: &[E]) -> Changes<E> {
    remove_where(list, |e| !items.contains(e))
}

/// Stable sort by `compare`, reported as a permutation. Already sorted
/// input is a no-op.
pub fn sort_by<E: Clone>(list: &[E], mut compare: impl FnMut(&E, &E) -> Ordering) -> Changes<E> {
    let mut order: Vec<usize> = (0..list.len()).collect();
    order.sort_by(|&a, &b| compare(&list[a], &list[b]));
    if order.iter().enumerate().all(|(new, &old)| new == old) {
        return Vec::new();
    }
    let mut permutation = vec![0; list.len()];
    for (new_index, &old_index) in order.iter().enumerate() {
        permutation[old_index] = new_index;
    }
    vec![ListElementaryChange::permutation(0, permutation)]
}

/// Apply elementary changes in order.
pub fn apply<E: Clone>(list: &mut Vec<E>, changes: &[ListElementaryChange<E>]) {
    for change in changes {
        change.apply_to(list);
    }
}
