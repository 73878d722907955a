#![forbid(unsafe_code)]

//! Observable list.
//!
//! # Invariants
//!
//! 1. Every effective mutation dispatches exactly one atomic change.
//! 2. Contiguous edits are one elementary change; scattered removals are
//!    one elementary change per maximal run, ascending.
//! 3. `set_all` with a different value replaces the full range in one
//!    elementary change; content-equal input does nothing.
//! 4. Sorting reports a permutation, never removals plus additions.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use super::{ChangeListener, InvalidationListener, Notifier, ObservableCollection};
use crate::change::{ListChange, ListEdit, ListElementaryChange};
use crate::config::DispatchConfig;
use crate::diff;
use crate::error::{CollectionError, CollectionResult};

/// Listener type for list changes.
pub type ListChangeListener<E> = ChangeListener<ListChange<E>>;

struct ListInner<E> {
    items: RefCell<Vec<E>>,
    notifier: Notifier<ObservableList<E>, ListChange<E>>,
}

/// A shared, observable, ordered sequence.
pub struct ObservableList<E> {
    inner: Rc<ListInner<E>>,
    read_only: bool,
}

impl<E> Clone for ObservableList<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: self.read_only,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.inner.items.borrow())
            .field("read_only", &self.read_only)
            .field("notifier", &self.inner.notifier)
            .finish()
    }
}

impl<E: Clone + PartialEq + 'static> Default for ObservableList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + PartialEq + 'static> FromIterator<E> for ObservableList<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<E: Clone + PartialEq + 'static> ObservableList<E> {
    /// Create an empty list with the default dispatch configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Vec::new(), &DispatchConfig::default())
    }

    /// Wrap existing contents. No notification is sent for them.
    #[must_use]
    pub fn from_vec(items: Vec<E>) -> Self {
        Self::with_config(items, &DispatchConfig::default())
    }

    /// Wrap existing contents using `config` for dispatch.
    #[must_use]
    pub fn with_config(items: Vec<E>, config: &DispatchConfig) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                notifier: Notifier::new(config),
            }),
            read_only: false,
        }
    }

    /// A read-only view sharing this list's contents and listeners.
    #[must_use]
    pub fn unmodifiable(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: true,
        }
    }

    /// Whether mutators on this handle are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether both handles share the same list (writability ignored).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Clone of the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<E> {
        self.inner.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn contains(&self, element: &E) -> bool {
        self.inner.items.borrow().contains(element)
    }

    /// Index of the first occurrence of `element`.
    #[must_use]
    pub fn index_of(&self, element: &E) -> Option<usize> {
        self.inner.items.borrow().iter().position(|e| e == element)
    }

    /// Snapshot of the contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.borrow().clone()
    }

    /// Borrow the contents for the duration of `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this list.
    pub fn with<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Whether both lists hold equal elements in the same order.
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.inner.items.borrow() == *other.inner.items.borrow()
    }

    // ── Mutators ─────────────────────────────────────────────────────────

    /// Append one element.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn add(&self, element: E) -> CollectionResult<bool> {
        self.mutate(|items| diff::list::insert(items, items.len(), vec![element]))
    }

    /// Insert `element` before `index`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view or when `index > len`.
    pub fn insert(&self, index: usize, element: E) -> CollectionResult<()> {
        self.mutate(|items| diff::list::insert(items, index, vec![element]))
            .map(|_| ())
    }

    /// Append every element of `items` as one change.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn add_all(&self, items: impl IntoIterator<Item = E>) -> CollectionResult<bool> {
        let items: Vec<E> = items.into_iter().collect();
        self.mutate(|current| diff::list::insert(current, current.len(), items))
    }

    /// Insert every element of `items` before `index` as one change.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view or when `index > len`.
    pub fn insert_all(&self, index: usize, items: impl IntoIterator<Item = E>) -> CollectionResult<bool> {
        let items: Vec<E> = items.into_iter().collect();
        self.mutate(|current| diff::list::insert(current, index, items))
    }

    /// Overwrite the element at `index`, returning the previous one.
    /// Writing an equal value fires nothing.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view or when `index >= len`.
    pub fn set(&self, index: usize, element: E) -> CollectionResult<E> {
        self.check_writable()?;
        let previous = self.get(index).ok_or(CollectionError::IndexOutOfBounds {
            index,
            len: self.len(),
        })?;
        self.mutate(|items| diff::list::set(items, index, element))?;
        Ok(previous)
    }

    /// Replace the whole contents.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn set_all(&self, items: impl IntoIterator<Item = E>) -> CollectionResult<bool> {
        let items: Vec<E> = items.into_iter().collect();
        self.mutate(|current| Ok(diff::list::set_all(current, items)))
    }

    /// Replace `self[from..to]` by `items` as one elementary change.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view or an invalid range.
    pub fn replace_range(
        &self,
        from: usize,
        to: usize,
        items: impl IntoIterator<Item = E>,
    ) -> CollectionResult<bool> {
        let items: Vec<E> = items.into_iter().collect();
        self.mutate(|current| diff::list::replace_range(current, from, to, items))
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view or when `index >= len`.
    pub fn remove_at(&self, index: usize) -> CollectionResult<E> {
        self.check_writable()?;
        let removed = self.get(index).ok_or(CollectionError::IndexOutOfBounds {
            index,
            len: self.len(),
        })?;
        self.mutate(|items| diff::list::remove_range(items, index, index + 1))?;
        Ok(removed)
    }

    /// Remove the first occurrence of `element`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove(&self, element: &E) -> CollectionResult<bool> {
        self.check_writable()?;
        match self.index_of(element) {
            Some(index) => self.mutate(|items| diff::list::remove_range(items, index, index + 1)),
            None => Ok(false),
        }
    }

    /// Remove `self[from..to]`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view or an invalid range.
    pub fn remove_range(&self, from: usize, to: usize) -> CollectionResult<bool> {
        self.mutate(|items| diff::list::remove_range(items, from, to))
    }

    /// Remove every occurrence of every element of `items`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove_all(&self, items: &[E]) -> CollectionResult<bool> {
        self.mutate(|current| Ok(diff::list::remove_all(current, items)))
    }

    /// Keep only elements contained in `items`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn retain_all(&self, items: &[E]) -> CollectionResult<bool> {
        self.mutate(|current| Ok(diff::list::retain_all(current, items)))
    }

    /// Keep only elements for which `keep` returns `true`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) -> CollectionResult<bool> {
        self.mutate(|current| Ok(diff::list::remove_where(current, |e| !keep(e))))
    }

    /// Remove everything.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn clear(&self) -> CollectionResult<bool> {
        self.mutate(|items| diff::list::remove_range(items, 0, items.len()))
    }

    /// Stable sort by `compare`, reported as a permutation.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn sort_by(&self, compare: impl FnMut(&E, &E) -> Ordering) -> CollectionResult<bool> {
        self.mutate(|items| Ok(diff::list::sort_by(items, compare)))
    }

    /// Reorder `self[from..from + permutation.len()]` so that the element at
    /// `from + k` moves to `permutation[k]`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view, or when the permutation does not map the
    /// range onto itself.
    pub fn permute(&self, from: usize, permutation: &[usize]) -> CollectionResult<bool> {
        self.check_writable()?;
        let len = self.len();
        let to = from.checked_add(permutation.len()).ok_or(CollectionError::InvalidRange {
            from,
            to: usize::MAX,
            len,
        })?;
        if to > len {
            return Err(CollectionError::InvalidRange { from, to, len });
        }
        let mut seen = vec![false; permutation.len()];
        for &target in permutation {
            if target < from || target >= to || seen[target - from] {
                return Err(CollectionError::IndexOutOfBounds { index: target, len: to });
            }
            seen[target - from] = true;
        }
        if permutation.iter().enumerate().all(|(k, &target)| target == from + k) {
            return Ok(false);
        }
        Ok(self.commit(vec![ListElementaryChange::permutation(
            from,
            permutation.to_vec(),
        )]))
    }

    // ── Listeners ────────────────────────────────────────────────────────

    pub fn add_listener(&self, listener: ListChangeListener<E>) {
        self.inner.notifier.add_change(listener);
    }

    pub fn remove_listener(&self, listener: &ListChangeListener<E>) -> bool {
        self.inner.notifier.remove_change(listener)
    }

    pub fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        self.inner.notifier.add_invalidation(listener);
    }

    pub fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        self.inner.notifier.remove_invalidation(listener)
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn check_writable(&self) -> CollectionResult<()> {
        if self.read_only {
            return Err(CollectionError::ReadOnly);
        }
        Ok(())
    }

    fn mutate(
        &self,
        compute: impl FnOnce(&Vec<E>) -> CollectionResult<Vec<ListElementaryChange<E>>>,
    ) -> CollectionResult<bool> {
        self.check_writable()?;
        let changes = {
            let items = self.inner.items.borrow();
            compute(&items)?
        };
        Ok(self.commit(changes))
    }

    fn commit(&self, changes: Vec<ListElementaryChange<E>>) -> bool {
        if changes.is_empty() {
            return false;
        }
        // Change listeners are sampled at commit; without any, the contents
        // snapshot is skipped and only invalidation fires.
        let contents = {
            let mut items = self.inner.items.borrow_mut();
            diff::list::apply(&mut items, &changes);
            self.inner
                .notifier
                .has_change_listeners()
                .then(|| items.clone())
        };
        match contents {
            Some(contents) => {
                let mut change = ListChange::with_context(changes, contents);
                self.inner.notifier.fire(self, &mut change);
            }
            None => self.inner.notifier.invalidate(self),
        }
        true
    }
}

impl<E: Clone + Ord + 'static> ObservableList<E> {
    /// Stable ascending sort, reported as a permutation.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn sort(&self) -> CollectionResult<bool> {
        self.sort_by(Ord::cmp)
    }
}

impl<E: Clone + PartialEq + 'static> ObservableCollection for ObservableList<E> {
    type Change = ListChange<E>;

    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other) && self.read_only == other.read_only
    }

    fn len(&self) -> usize {
        ObservableList::len(self)
    }

    fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        ObservableList::add_invalidation_listener(self, listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        ObservableList::remove_invalidation_listener(self, listener)
    }

    fn add_change_listener(&self, listener: ChangeListener<Self::Change>) {
        self.add_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeListener<Self::Change>) -> bool {
        self.remove_listener(listener)
    }

    fn transition(old: Option<&Self>, new: Option<&Self>) -> Option<Self::Change> {
        let old_items = old.map(Self::to_vec).unwrap_or_default();
        let new_items = new.map(Self::to_vec).unwrap_or_default();
        let changes = diff::list::transition(&old_items, &new_items);
        if changes.is_empty() {
            return None;
        }
        Some(ListChange::with_context(changes, new_items))
    }

    fn replay(&self, change: &Self::Change) -> CollectionResult<()> {
        for elementary in change.elementary_changes() {
            match elementary.edit() {
                ListEdit::Permutation(perm) => {
                    self.permute(elementary.from(), perm)?;
                }
                ListEdit::Replace { removed, added } => {
                    let from = elementary.from();
                    self.replace_range(from, from + removed.len(), added.iter().cloned())?;
                }
            }
        }
        Ok(())
    }

    fn assign_from(&self, source: Option<&Self>) -> CollectionResult<bool> {
        let items = source.map(Self::to_vec).unwrap_or_default();
        self.set_all(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder<E: Clone + PartialEq + fmt::Debug + 'static>(
        list: &ObservableList<E>,
    ) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        list.add_listener(Rc::new(move |change: &mut ListChange<E>| {
            log_clone.borrow_mut().push(change.to_string());
        }));
        log
    }

    #[test]
    fn add_and_insert() {
        let list = ObservableList::from_vec(vec![1, 3]);
        let log = recorder(&list);
        list.insert(1, 2).unwrap();
        list.add(4).unwrap();
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(*log.borrow(), vec!["Added [2] at 1.", "Added [4] at 3."]);
    }

    #[test]
    fn insert_out_of_bounds() {
        let list = ObservableList::from_vec(vec![1]);
        assert_eq!(
            list.insert(5, 2),
            Err(CollectionError::IndexOutOfBounds { index: 5, len: 1 })
        );
    }

    #[test]
    fn set_returns_previous_and_skips_equal() {
        let list = ObservableList::from_vec(vec!['a', 'b']);
        let log = recorder(&list);
        assert_eq!(list.set(1, 'b'), Ok('b'));
        assert!(log.borrow().is_empty());
        assert_eq!(list.set(1, 'c'), Ok('b'));
        assert_eq!(*log.borrow(), vec!["Replaced ['b'] by ['c'] at 1."]);
    }

    #[test]
    fn remove_variants() {
        let list = ObservableList::from_vec(vec![1, 2, 3, 2]);
        let log = recorder(&list);
        assert_eq!(list.remove(&2), Ok(true));
        assert_eq!(list.to_vec(), vec![1, 3, 2]);
        assert_eq!(list.remove(&9), Ok(false));
        assert_eq!(list.remove_at(0), Ok(1));
        assert!(list.remove_at(5).is_err());
        assert_eq!(list.remove_range(0, 2), Ok(true));
        assert!(list.is_empty());
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn clear_empty_is_noop() {
        let list: ObservableList<i32> = ObservableList::new();
        let log = recorder(&list);
        assert_eq!(list.clear(), Ok(false));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn retain_with_closure() {
        let list: ObservableList<i32> = (1..=6).collect();
        list.retain(|e| e % 2 == 0).unwrap();
        assert_eq!(list.to_vec(), vec![2, 4, 6]);
    }

    #[test]
    fn sort_reports_permutation() {
        let list = ObservableList::from_vec(vec![3, 1, 2]);
        let perms = Rc::new(RefCell::new(Vec::new()));
        let perms_clone = Rc::clone(&perms);
        list.add_listener(Rc::new(move |change: &mut ListChange<i32>| {
            while change.next() {
                assert_eq!(change.was_permutated(), Ok(true));
                let from = change.from().unwrap();
                let to = change.to().unwrap();
                for i in from..to {
                    perms_clone.borrow_mut().push(change.permutation(i).unwrap());
                }
            }
        }));
        assert_eq!(list.sort(), Ok(true));
        assert_eq!(list.to_vec(), vec![1, 2, 3]);
        assert_eq!(*perms.borrow(), vec![2, 0, 1]);
        assert_eq!(list.sort(), Ok(false));
    }

    #[test]
    fn permute_validates() {
        let list = ObservableList::from_vec(vec!['a', 'b', 'c']);
        assert!(list.permute(0, &[0, 0, 1]).is_err());
        assert!(list.permute(1, &[1, 2, 3]).is_err());
        assert_eq!(list.permute(0, &[0, 1, 2]), Ok(false));
        assert_eq!(list.permute(1, &[2, 1]), Ok(true));
        assert_eq!(list.to_vec(), vec!['a', 'c', 'b']);
    }

    #[test]
    fn permute_rejects_overflowing_range() {
        let list = ObservableList::from_vec(vec!['a']);
        assert_eq!(
            list.permute(usize::MAX, &[0]),
            Err(CollectionError::InvalidRange {
                from: usize::MAX,
                to: usize::MAX,
                len: 1
            })
        );
        assert_eq!(list.to_vec(), vec!['a']);
    }

    #[test]
    fn unobserved_mutation_still_invalidates() {
        let list = ObservableList::from_vec(vec![3, 1, 2]);
        let invalidations = Rc::new(Cell::new(0));
        let counter = Rc::clone(&invalidations);
        list.add_invalidation_listener(Rc::new(move |_: &ObservableList<i32>| {
            counter.set(counter.get() + 1);
        }));
        list.add(4).unwrap();
        list.sort().unwrap();
        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(invalidations.get(), 2);

        let log = recorder(&list);
        list.remove_at(0).unwrap();
        assert_eq!(invalidations.get(), 3);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn change_listener_added_during_invalidation_waits_for_next_change() {
        let list = ObservableList::from_vec(vec![1]);
        let late: Rc<RefCell<Vec<Vec<i32>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&late);
        let armed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&armed);
        list.add_invalidation_listener(Rc::new(move |source: &ObservableList<i32>| {
            if !flag.replace(true) {
                let sink = Rc::clone(&sink);
                source.add_listener(Rc::new(move |change: &mut ListChange<i32>| {
                    sink.borrow_mut().push(change.list().to_vec());
                }));
            }
        }));
        list.add(2).unwrap();
        assert!(late.borrow().is_empty());
        list.add(3).unwrap();
        assert_eq!(*late.borrow(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn invalidation_fires_before_change() {
        let list = ObservableList::from_vec(vec![1]);
        let order = Rc::new(RefCell::new(Vec::new()));
        let o1 = Rc::clone(&order);
        list.add_listener(Rc::new(move |_: &mut ListChange<i32>| o1.borrow_mut().push("change")));
        let o2 = Rc::clone(&order);
        list.add_invalidation_listener(Rc::new(move |_: &ObservableList<i32>| {
            o2.borrow_mut().push("invalidation");
        }));
        list.add(2).unwrap();
        assert_eq!(*order.borrow(), vec!["invalidation", "change"]);
    }

    #[test]
    fn unmodifiable_view_rejects_writes() {
        let list = ObservableList::from_vec(vec![1]);
        let view = list.unmodifiable();
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        view.add_listener(Rc::new(move |_: &mut ListChange<i32>| {
            count_clone.set(count_clone.get() + 1);
        }));
        assert_eq!(view.add(2), Err(CollectionError::ReadOnly));
        assert_eq!(view.clear(), Err(CollectionError::ReadOnly));
        list.add(2).unwrap();
        assert_eq!(view.to_vec(), vec![1, 2]);
        assert_eq!(count.get(), 1);
        assert!(view.ptr_eq(&list));
        assert!(!view.same_as(&list));
    }

    #[test]
    fn listener_may_mutate_reentrantly() {
        let list = ObservableList::from_vec(vec![0]);
        let handle = list.clone();
        list.add_listener(Rc::new(move |change: &mut ListChange<i32>| {
            if change.list().len() < 3 {
                handle.add(change.list().len() as i32).unwrap();
            }
        }));
        list.add(1).unwrap();
        assert_eq!(list.to_vec(), vec![0, 1, 2]);
    }
}
