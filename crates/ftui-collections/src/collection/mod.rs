#![forbid(unsafe_code)]

//! Observable collections.
//!
//! Every collection is a cheap, cloneable handle to shared state: cloning an
//! [`ObservableList`] (or any other kind) yields a second handle to the
//! **same** store and the same listeners, exactly like cloning an
//! `Observable` value.
//!
//! # Mutation pipeline
//!
//! ```text
//! mutator ──► diff (pure, against current store)
//!               │ empty? ──► return, nothing fires
//!               ▼
//!             apply to store ──► package change
//!               ▼
//!             invalidation listeners ──► element-change listeners
//! ```
//!
//! No borrow of the store is held while listeners run, so listeners may
//! read the collection, mutate it, or (un)register listeners.
//!
//! # Read-only views
//!
//! `unmodifiable()` returns a handle sharing store and listeners whose
//! mutators all fail with [`CollectionError::ReadOnly`](crate::CollectionError::ReadOnly).

pub mod list;
pub mod map;
pub mod multimap;
pub mod multiset;
pub mod set;

use std::fmt;
use std::rc::Rc;

use crate::change::AtomicChange;
use crate::config::DispatchConfig;
use crate::error::CollectionResult;
use crate::fault::ExceptionBoundary;
use crate::listener::{ListenerChannel, ListenerRegistry};

pub use list::ObservableList;
pub use map::ObservableMap;
pub use multimap::ObservableSetMultimap;
pub use multiset::ObservableMultiset;
pub use set::ObservableSet;

/// Listener notified, without payload, after every effective mutation.
pub type InvalidationListener<C> = Rc<dyn Fn(&C)>;

/// Listener receiving the atomic change of every effective mutation.
///
/// The change's cursor is rewound before each listener is called.
pub type ChangeListener<Ch> = Rc<dyn Fn(&mut Ch)>;

/// Operations shared by every observable collection kind.
///
/// Properties and content bindings are written against this trait.
pub trait ObservableCollection: Clone + 'static {
    /// The atomic change type this collection dispatches.
    type Change: AtomicChange + 'static;

    /// Reference identity: same shared state and same writability.
    fn same_as(&self, other: &Self) -> bool;

    /// Number of elements (occurrences for multisets, entries for maps and
    /// multimaps).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add_invalidation_listener(&self, listener: InvalidationListener<Self>);

    fn remove_invalidation_listener(&self, listener: &InvalidationListener<Self>) -> bool;

    fn add_change_listener(&self, listener: ChangeListener<Self::Change>);

    fn remove_change_listener(&self, listener: &ChangeListener<Self::Change>) -> bool;

    /// Change describing the move from `old` to `new` contents, treating an
    /// absent value as empty. `None` when nothing observable differs.
    fn transition(old: Option<&Self>, new: Option<&Self>) -> Option<Self::Change>;

    /// Re-perform the elementary edits of `change` through this
    /// collection's mutators.
    ///
    /// # Errors
    ///
    /// Propagates mutator errors (read-only target, ranges that do not fit).
    fn replay(&self, change: &Self::Change) -> CollectionResult<()>;

    /// Make this collection's contents equal to `source` (empty for `None`).
    ///
    /// # Errors
    ///
    /// Fails on a read-only target.
    fn assign_from(&self, source: Option<&Self>) -> CollectionResult<bool>;
}

/// Listener registries plus the boundary guarding them.
pub(crate) struct Notifier<C, Ch> {
    invalidation: ListenerRegistry<dyn Fn(&C)>,
    changes: ListenerRegistry<dyn Fn(&mut Ch)>,
    boundary: ExceptionBoundary,
    trace_dispatch: bool,
}

impl<C, Ch: AtomicChange> Notifier<C, Ch> {
    pub(crate) fn new(config: &DispatchConfig) -> Self {
        Self {
            invalidation: ListenerRegistry::new(),
            changes: ListenerRegistry::new(),
            boundary: ExceptionBoundary::new(config),
            trace_dispatch: config.trace_dispatch,
        }
    }

    pub(crate) fn add_invalidation(&self, listener: Rc<dyn Fn(&C)>) {
        self.invalidation.add(listener);
    }

    pub(crate) fn remove_invalidation(&self, listener: &Rc<dyn Fn(&C)>) -> bool {
        self.invalidation.remove(listener)
    }

    pub(crate) fn add_change(&self, listener: Rc<dyn Fn(&mut Ch)>) {
        self.changes.add(listener);
    }

    pub(crate) fn remove_change(&self, listener: &Rc<dyn Fn(&mut Ch)>) -> bool {
        self.changes.remove(listener)
    }

    pub(crate) fn has_change_listeners(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Invalidation channel only.
    pub(crate) fn invalidate(&self, source: &C) {
        self.invalidation.dispatch(
            &self.boundary,
            ListenerChannel::Invalidation,
            self.trace_dispatch,
            |listener| listener(source),
        );
    }

    /// Invalidation first, then element-change.
    pub(crate) fn fire(&self, source: &C, change: &mut Ch) {
        self.invalidate(source);
        self.changes.dispatch(
            &self.boundary,
            ListenerChannel::ElementChange,
            self.trace_dispatch,
            |listener| {
                change.rewind();
                listener(change);
            },
        );
    }
}

impl<C, Ch> fmt::Debug for Notifier<C, Ch> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("invalidation_listeners", &self.invalidation.len())
            .field("change_listeners", &self.changes.len())
            .finish()
    }
}
