#![forbid(unsafe_code)]

//! Observable multiset: elements with positive occurrence counts.
//!
//! `len()` counts occurrences, so a multiset holding `a` three times and
//! `b` once has length 4 and two distinct elements.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use super::{ChangeListener, InvalidationListener, Notifier, ObservableCollection};
use crate::change::{MultisetChange, MultisetElementaryChange};
use crate::config::DispatchConfig;
use crate::diff;
use crate::error::{CollectionError, CollectionResult};

/// Listener type for multiset changes.
pub type MultisetChangeListener<E> = ChangeListener<MultisetChange<E>>;

struct MultisetInner<E> {
    counts: RefCell<IndexMap<E, usize>>,
    notifier: Notifier<ObservableMultiset<E>, MultisetChange<E>>,
}

/// A shared, observable multiset.
pub struct ObservableMultiset<E> {
    inner: Rc<MultisetInner<E>>,
    read_only: bool,
}

impl<E> Clone for ObservableMultiset<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: self.read_only,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableMultiset<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMultiset")
            .field("counts", &self.inner.counts.borrow())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl<E: Clone + Eq + Hash + 'static> Default for ObservableMultiset<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Eq + Hash + 'static> FromIterator<E> for ObservableMultiset<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::with_config(iter, &DispatchConfig::default())
    }
}

impl<E: Clone + Eq + Hash + 'static> ObservableMultiset<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(std::iter::empty(), &DispatchConfig::default())
    }

    /// One occurrence per item of `items`, using `config` for dispatch.
    #[must_use]
    pub fn with_config(items: impl IntoIterator<Item = E>, config: &DispatchConfig) -> Self {
        let mut counts: IndexMap<E, usize> = IndexMap::new();
        for item in items {
            *counts.entry(item).or_insert(0) += 1;
        }
        Self {
            inner: Rc::new(MultisetInner {
                counts: RefCell::new(counts),
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

    /// Total number of occurrences, saturating at `usize::MAX`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .counts
            .borrow()
            .values()
            .fold(0usize, |total, &n| total.saturating_add(n))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.counts.borrow().is_empty()
    }

    /// Occurrences of `element` (zero when absent).
    #[must_use]
    pub fn count(&self, element: &E) -> usize {
        self.inner.counts.borrow().get(element).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn contains(&self, element: &E) -> bool {
        self.inner.counts.borrow().contains_key(element)
    }

    /// Distinct elements in first-insertion order.
    #[must_use]
    pub fn element_set(&self) -> IndexSet<E> {
        self.inner.counts.borrow().keys().cloned().collect()
    }

    /// `(element, count)` pairs in first-insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(E, usize)> {
        self.inner
            .counts
            .borrow()
            .iter()
            .map(|(e, &n)| (e.clone(), n))
            .collect()
    }

    /// # Errors
    ///
    /// Fails on a read-only view, or when the count would overflow.
    pub fn add(&self, element: E) -> CollectionResult<bool> {
        self.mutate(|counts| diff::multiset::add(counts, element, 1))
    }

    /// Add `occurrences` of `element`, returning the previous count.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view. Returns
    /// [`CollectionError::CountOverflow`] without changing anything when the
    /// new count would not fit in a `usize`.
    pub fn add_occurrences(&self, element: E, occurrences: usize) -> CollectionResult<usize> {
        self.check_writable()?;
        let previous = self.count(&element);
        self.mutate(|counts| diff::multiset::add(counts, element, occurrences))?;
        Ok(previous)
    }

    /// Remove one occurrence of `element`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove(&self, element: &E) -> CollectionResult<bool> {
        self.mutate(|counts| Ok(diff::multiset::remove(counts, element, 1)))
    }

    /// Remove up to `occurrences` of `element`, returning the previous count.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove_occurrences(&self, element: &E, occurrences: usize) -> CollectionResult<usize> {
        self.check_writable()?;
        let previous = self.count(element);
        self.mutate(|counts| Ok(diff::multiset::remove(counts, element, occurrences)))?;
        Ok(previous)
    }

    /// Set the count of `element`, returning the previous count.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn set_count(&self, element: E, count: usize) -> CollectionResult<usize> {
        self.check_writable()?;
        let previous = self.count(&element);
        self.mutate(|counts| Ok(diff::multiset::set_count(counts, element, count)))?;
        Ok(previous)
    }

    /// Set the count of `element` to `count` only if it currently equals
    /// `expected`. Returns whether the comparison matched.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn set_count_if(&self, element: E, expected: usize, count: usize) -> CollectionResult<bool> {
        self.check_writable()?;
        if self.count(&element) != expected {
            return Ok(false);
        }
        self.mutate(|counts| Ok(diff::multiset::set_count_if(counts, element, expected, count)))?;
        Ok(true)
    }

    /// One occurrence per item, as one change.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view, or when any count would overflow.
    pub fn add_all(&self, items: impl IntoIterator<Item = E>) -> CollectionResult<bool> {
        self.mutate(|counts| diff::multiset::add_all(counts, items))
    }

    /// Remove every occurrence of every element of `items`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove_all(&self, items: &[E]) -> CollectionResult<bool> {
        self.mutate(|counts| Ok(diff::multiset::remove_all(counts, items)))
    }

    /// Remove every occurrence of elements not in `items`.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn retain_all(&self, items: &[E]) -> CollectionResult<bool> {
        self.mutate(|counts| Ok(diff::multiset::retain_all(counts, items)))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn clear(&self) -> CollectionResult<bool> {
        self.mutate(|counts| Ok(diff::multiset::remove_where(counts, |_| true)))
    }

    pub fn add_listener(&self, listener: MultisetChangeListener<E>) {
        self.inner.notifier.add_change(listener);
    }

    pub fn remove_listener(&self, listener: &MultisetChangeListener<E>) -> bool {
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
        compute: impl FnOnce(&IndexMap<E, usize>) -> CollectionResult<Vec<MultisetElementaryChange<E>>>,
    ) -> CollectionResult<bool> {
        self.check_writable()?;
        let changes = compute(&self.inner.counts.borrow())?;
        Ok(self.commit(changes))
    }

    fn commit(&self, changes: Vec<MultisetElementaryChange<E>>) -> bool {
        if changes.is_empty() {
            return false;
        }
        diff::multiset::apply(&mut self.inner.counts.borrow_mut(), &changes);
        let mut change = MultisetChange::new(changes);
        self.inner.notifier.fire(self, &mut change);
        true
    }
}

impl<E: Clone + Eq + Hash + 'static> ObservableCollection for ObservableMultiset<E> {
    type Change = MultisetChange<E>;

    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other) && self.read_only == other.read_only
    }

    fn len(&self) -> usize {
        ObservableMultiset::len(self)
    }

    fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        ObservableMultiset::add_invalidation_listener(self, listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        ObservableMultiset::remove_invalidation_listener(self, listener)
    }

    fn add_change_listener(&self, listener: ChangeListener<Self::Change>) {
        self.add_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeListener<Self::Change>) -> bool {
        self.remove_listener(listener)
    }

    fn transition(old: Option<&Self>, new: Option<&Self>) -> Option<Self::Change> {
        let snapshot = |multiset: Option<&Self>| {
            multiset
                .map(|m| m.inner.counts.borrow().clone())
                .unwrap_or_default()
        };
        let changes = diff::multiset::transition(&snapshot(old), &snapshot(new));
        (!changes.is_empty()).then(|| MultisetChange::new(changes))
    }

    fn replay(&self, change: &Self::Change) -> CollectionResult<()> {
        for elementary in change.elementary_changes() {
            let element = elementary.element();
            let count = self.count(element);
            let target = count
                .checked_add(elementary.add_count())
                .ok_or(CollectionError::CountOverflow {
                    count,
                    occurrences: elementary.add_count(),
                })?
                .saturating_sub(elementary.remove_count());
            self.set_count(element.clone(), target)?;
        }
        Ok(())
    }

    fn assign_from(&self, source: Option<&Self>) -> CollectionResult<bool> {
        self.check_writable()?;
        let target = source
            .map(|m| m.inner.counts.borrow().clone())
            .unwrap_or_default();
        self.mutate(|current| Ok(diff::multiset::transition(current, &target)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(multiset: &ObservableMultiset<char>) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        multiset.add_listener(Rc::new(move |change: &mut MultisetChange<char>| {
            while change.next() {
                log_clone.borrow_mut().push(change.current().unwrap().to_string());
            }
        }));
        log
    }

    #[test]
    fn counts_and_len() {
        let multiset: ObservableMultiset<char> = "abaca".chars().collect();
        assert_eq!(multiset.count(&'a'), 3);
        assert_eq!(multiset.len(), 5);
        assert_eq!(multiset.element_set().len(), 3);
        assert_eq!(multiset.count(&'z'), 0);
    }

    #[test]
    fn set_count_reports_deltas() {
        let multiset = ObservableMultiset::new();
        let log = recorder(&multiset);
        assert_eq!(multiset.set_count('x', 3), Ok(0));
        assert_eq!(multiset.set_count('x', 1), Ok(3));
        assert_eq!(multiset.set_count('x', 1), Ok(1));
        assert_eq!(
            *log.borrow(),
            vec!["Added 3 occurrences of 'x'.", "Removed 2 occurrences of 'x'."]
        );
    }

    #[test]
    fn set_count_if_compares_first() {
        let multiset: ObservableMultiset<char> = "aa".chars().collect();
        let log = recorder(&multiset);
        assert_eq!(multiset.set_count_if('a', 1, 5), Ok(false));
        assert!(log.borrow().is_empty());
        assert_eq!(multiset.set_count_if('a', 2, 0), Ok(true));
        assert!(!multiset.contains(&'a'));
        assert_eq!(*log.borrow(), vec!["Removed 2 occurrences of 'a'."]);
    }

    #[test]
    fn remove_occurrences_is_clamped() {
        let multiset: ObservableMultiset<char> = "bb".chars().collect();
        assert_eq!(multiset.remove_occurrences(&'b', 10), Ok(2));
        assert!(multiset.is_empty());
        assert_eq!(multiset.remove(&'b'), Ok(false));
    }

    #[test]
    fn add_occurrences_zero_is_noop() {
        let multiset: ObservableMultiset<char> = ObservableMultiset::new();
        let log = recorder(&multiset);
        assert_eq!(multiset.add_occurrences('q', 0), Ok(0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn read_only_view() {
        let multiset: ObservableMultiset<char> = ObservableMultiset::new();
        let view = multiset.unmodifiable();
        assert_eq!(view.add('a'), Err(CollectionError::ReadOnly));
        assert_eq!(view.set_count_if('a', 0, 1), Err(CollectionError::ReadOnly));
    }

    #[test]
    fn overflowing_add_is_rejected_without_notification() {
        let multiset: ObservableMultiset<char> = ObservableMultiset::new();
        assert_eq!(multiset.add_occurrences('a', usize::MAX), Ok(0));
        let log = recorder(&multiset);

        let err = multiset.add_occurrences('a', 1).unwrap_err();
        assert_eq!(
            err,
            CollectionError::CountOverflow {
                count: usize::MAX,
                occurrences: 1
            }
        );
        assert_eq!(err.kind(), crate::error::ErrorKind::Argument);
        assert!(multiset.add('a').is_err());
        assert!(multiset.add_all(['b', 'a']).is_err());
        assert_eq!(multiset.count(&'a'), usize::MAX);
        assert!(!multiset.contains(&'b'));
        assert!(log.borrow().is_empty());

        multiset.add('b').unwrap();
        assert_eq!(multiset.len(), usize::MAX);
    }
}
