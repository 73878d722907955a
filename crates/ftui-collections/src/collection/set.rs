#![forbid(unsafe_code)]

//! Observable set with insertion-ordered iteration.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexSet;

use super::{ChangeListener, InvalidationListener, Notifier, ObservableCollection};
use crate::change::{SetChange, SetElementaryChange};
use crate::config::DispatchConfig;
use crate::diff;
use crate::error::{CollectionError, CollectionResult};

/// Listener type for set changes.
pub type SetChangeListener<E> = ChangeListener<SetChange<E>>;

struct SetInner<E> {
    items: RefCell<IndexSet<E>>,
    notifier: Notifier<ObservableSet<E>, SetChange<E>>,
}

/// A shared, observable set of distinct elements.
pub struct ObservableSet<E> {
    inner: Rc<SetInner<E>>,
    read_only: bool,
}

impl<E> Clone for ObservableSet<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            read_only: self.read_only,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSet")
            .field("items", &self.inner.items.borrow())
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl<E: Clone + Eq + Hash + 'static> Default for ObservableSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Eq + Hash + 'static> FromIterator<E> for ObservableSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::with_config(iter, &DispatchConfig::default())
    }
}

impl<E: Clone + Eq + Hash + 'static> ObservableSet<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(std::iter::empty(), &DispatchConfig::default())
    }

    /// Wrap existing elements (duplicates collapse) using `config`.
    #[must_use]
    pub fn with_config(items: impl IntoIterator<Item = E>, config: &DispatchConfig) -> Self {
        Self {
            inner: Rc::new(SetInner {
                items: RefCell::new(items.into_iter().collect()),
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

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, element: &E) -> bool {
        self.inner.items.borrow().contains(element)
    }

    /// Elements in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.borrow().iter().cloned().collect()
    }

    pub fn with<R>(&self, f: impl FnOnce(&IndexSet<E>) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Insert `element`; `false` if it was already present.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn add(&self, element: E) -> CollectionResult<bool> {
        self.mutate(|items| diff::set::add_all(items, [element]))
    }

    /// Insert every element not yet present, as one change.
    ///
    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn add_all(&self, items: impl IntoIterator<Item = E>) -> CollectionResult<bool> {
        self.mutate(|current| diff::set::add_all(current, items))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove(&self, element: &E) -> CollectionResult<bool> {
        self.mutate(|items| diff::set::remove_all(items, std::slice::from_ref(element)))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn remove_all(&self, items: &[E]) -> CollectionResult<bool> {
        self.mutate(|current| diff::set::remove_all(current, items))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn retain_all(&self, items: &[E]) -> CollectionResult<bool> {
        self.mutate(|current| diff::set::retain_all(current, items))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn retain(&self, mut keep: impl FnMut(&E) -> bool) -> CollectionResult<bool> {
        self.mutate(|current| diff::set::remove_where(current, |e| !keep(e)))
    }

    /// # Errors
    ///
    /// Fails on a read-only view.
    pub fn clear(&self) -> CollectionResult<bool> {
        self.mutate(|items| diff::set::remove_where(items, |_| true))
    }

    pub fn add_listener(&self, listener: SetChangeListener<E>) {
        self.inner.notifier.add_change(listener);
    }

    pub fn remove_listener(&self, listener: &SetChangeListener<E>) -> bool {
        self.inner.notifier.remove_change(listener)
    }

    pub fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        self.inner.notifier.add_invalidation(listener);
    }

    pub fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        self.inner.notifier.remove_invalidation(listener)
    }

    fn mutate(
        &self,
        compute: impl FnOnce(&IndexSet<E>) -> Vec<SetElementaryChange<E>>,
    ) -> CollectionResult<bool> {
        if self.read_only {
            return Err(CollectionError::ReadOnly);
        }
        let changes = compute(&self.inner.items.borrow());
        Ok(self.commit(changes))
    }

    fn commit(&self, changes: Vec<SetElementaryChange<E>>) -> bool {
        if changes.is_empty() {
            return false;
        }
        diff::set::apply(&mut self.inner.items.borrow_mut(), &changes);
        let mut change = SetChange::new(changes);
        self.inner.notifier.fire(self, &mut change);
        true
    }
}

impl<E: Clone + Eq + Hash + 'static> ObservableCollection for ObservableSet<E> {
    type Change = SetChange<E>;

    fn same_as(&self, other: &Self) -> bool {
        self.ptr_eq(other) && self.read_only == other.read_only
    }

    fn len(&self) -> usize {
        ObservableSet::len(self)
    }

    fn add_invalidation_listener(&self, listener: InvalidationListener<Self>) {
        ObservableSet::add_invalidation_listener(self, listener);
    }

    fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool {
        ObservableSet::remove_invalidation_listener(self, listener)
    }

    fn add_change_listener(&self, listener: ChangeListener<Self::Change>) {
        self.add_listener(listener);
    }

    fn remove_change_listener(&self, listener: &ChangeListener<Self::Change>) -> bool {
        self.remove_listener(listener)
    }

    fn transition(old: Option<&Self>, new: Option<&Self>) -> Option<Self::Change> {
        let snapshot = |set: Option<&Self>| {
            set.map(|s| s.inner.items.borrow().clone())
                .unwrap_or_default()
        };
        let changes = diff::set::transition(&snapshot(old), &snapshot(new));
        (!changes.is_empty()).then(|| SetChange::new(changes))
    }

    fn replay(&self, change: &Self::Change) -> CollectionResult<()> {
        for elementary in change.elementary_changes() {
            match elementary {
                SetElementaryChange::Added(e) => self.add(e.clone())?,
                SetElementaryChange::Removed(e) => self.remove(e)?,
            };
        }
        Ok(())
    }

    fn assign_from(&self, source: Option<&Self>) -> CollectionResult<bool> {
        if self.read_only {
            return Err(CollectionError::ReadOnly);
        }
        let target = source.map(|s| s.inner.items.borrow().clone()).unwrap_or_default();
        self.mutate(|current| diff::set::transition(current, &target))
    }
}
