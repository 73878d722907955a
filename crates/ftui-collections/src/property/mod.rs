#![forbid(unsafe_code)]

//! Collection-valued properties.
//!
//! A [`Property<C>`] holds an optional handle to an observable collection.
//! It does not own that collection: the property observes it, re-fires its
//! changes, and may be repointed or cleared at any time.
//!
//! # Channels
//!
//! | Channel | Payload | Fired on |
//! |---------|---------|----------|
//! | invalidation | the property | every reference change and content change |
//! | element-change | `&mut C::Change` | content changes and non-empty reference transitions |
//! | value-change | `(old, new)` | every reference change; `(cur, cur)` on content changes |
//!
//! Channels always fire in the order invalidation, element-change,
//! value-change.
//!
//! # Invariants
//!
//! 1. `set(v)` with `v` reference-identical to the current value fires
//!    nothing.
//! 2. A reference transition is reported as the diff between the old and
//!    new contents, an absent value counting as empty.
//! 3. While reference-bound, `set` fails with
//!    [`CollectionError::BoundValue`] and the value tracks the source.
//! 4. A property is never reference-bound and content-bound to the same
//!    peer.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Listener panics | Bug in listener | Isolated by the boundary, dispatch continues |
//! | Content replay rejected | Peer collection is read-only or out of sync | Logged at `warn`, binding stays |
//! | Peer dropped | Last handle released | Binding becomes inert |

mod binding;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::change::AtomicChange;
use crate::collection::{
    ChangeListener, ObservableCollection, ObservableList, ObservableMap, ObservableMultiset,
    ObservableSet, ObservableSetMultimap,
};
use crate::config::DispatchConfig;
use crate::error::{CollectionError, CollectionResult};
use crate::fault::ExceptionBoundary;
use crate::listener::{ListenerChannel, ListenerRegistry};
use crate::value::ObservableValue;

use binding::{ContentBinding, ReferenceBinding};

/// Listener notified, without payload, after every change of a property.
pub type PropertyInvalidationListener<C> = Rc<dyn Fn(&Property<C>)>;

/// Listener receiving `(property, old, new)` after every change of a
/// property.
pub type ValueChangeListener<C> = Rc<dyn Fn(&Property<C>, Option<&C>, Option<&C>)>;

pub type ListProperty<E> = Property<ObservableList<E>>;
pub type SetProperty<E> = Property<ObservableSet<E>>;
pub type MapProperty<K, V> = Property<ObservableMap<K, V>>;
pub type MultisetProperty<E> = Property<ObservableMultiset<E>>;
pub type SetMultimapProperty<K, V> = Property<ObservableSetMultimap<K, V>>;

struct PropertyInner<C: ObservableCollection> {
    this: Weak<PropertyInner<C>>,
    value: RefCell<Option<C>>,
    binding: RefCell<Option<ReferenceBinding<C>>>,
    content_bindings: RefCell<Vec<ContentBinding<C>>>,
    invalidation: ListenerRegistry<dyn Fn(&Property<C>)>,
    value_change: ListenerRegistry<dyn Fn(&Property<C>, Option<&C>, Option<&C>)>,
    changes: ListenerRegistry<dyn Fn(&mut C::Change)>,
    /// Registered on the current collection; re-fires its changes.
    forwarder: RefCell<Option<ChangeListener<C::Change>>>,
    /// Bumped on every reference change. A forwarder only re-fires while
    /// its own generation is current.
    generation: Cell<u64>,
    /// Set while a reference transition is being dispatched.
    transitioning: Cell<bool>,
    boundary: ExceptionBoundary,
    trace_dispatch: bool,
    size: ObservableValue<usize>,
    empty: ObservableValue<bool>,
}

/// An observable, bindable reference to a collection.
///
/// Cloning yields a second handle to the same property.
pub struct Property<C: ObservableCollection> {
    inner: Rc<PropertyInner<C>>,
}

impl<C: ObservableCollection> Clone for Property<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: ObservableCollection> Default for Property<C> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<C: ObservableCollection> fmt::Debug for Property<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("has_value", &self.inner.value.borrow().is_some())
            .field("bound", &self.is_bound())
            .field("content_bindings", &self.inner.content_bindings.borrow().len())
            .field("invalidation_listeners", &self.inner.invalidation.len())
            .field("change_listeners", &self.inner.changes.len())
            .field("value_listeners", &self.inner.value_change.len())
            .finish()
    }
}

impl<C: ObservableCollection> Property<C> {
    /// Create a property with the default dispatch configuration.
    #[must_use]
    pub fn new(value: Option<C>) -> Self {
        Self::with_config(value, &DispatchConfig::default())
    }

    /// Create a property whose listener faults go through `config`.
    #[must_use]
    pub fn with_config(value: Option<C>, config: &DispatchConfig) -> Self {
        let size = value.as_ref().map_or(0, C::len);
        let inner = Rc::new_cyclic(|this: &Weak<PropertyInner<C>>| PropertyInner {
            this: Weak::clone(this),
            value: RefCell::new(value),
            binding: RefCell::new(None),
            content_bindings: RefCell::new(Vec::new()),
            invalidation: ListenerRegistry::new(),
            value_change: ListenerRegistry::new(),
            changes: ListenerRegistry::new(),
            forwarder: RefCell::new(None),
            generation: Cell::new(0),
            transitioning: Cell::new(false),
            boundary: ExceptionBoundary::new(config),
            trace_dispatch: config.trace_dispatch,
            size: ObservableValue::with_config(size, config),
            empty: ObservableValue::with_config(size == 0, config),
        });
        let property = Self { inner };
        property.attach_forwarder(property.get().as_ref());
        property
    }

    /// Whether both handles refer to the same property.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The current collection handle. Allowed while bound.
    #[must_use]
    pub fn get(&self) -> Option<C> {
        self.inner.value.borrow().clone()
    }

    /// Point the property at `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::BoundValue`] while reference-bound.
    pub fn set(&self, value: Option<C>) -> CollectionResult<()> {
        if self.is_bound() {
            return Err(CollectionError::BoundValue);
        }
        self.replace_value(value);
        Ok(())
    }

    /// Size of the current collection, kept in sync (absent counts as 0).
    #[must_use]
    pub fn size_property(&self) -> ObservableValue<usize> {
        self.inner.size.clone()
    }

    /// Emptiness of the current collection, kept in sync.
    #[must_use]
    pub fn empty_property(&self) -> ObservableValue<bool> {
        self.inner.empty.clone()
    }

    /// A view exposing reads and listener registration only.
    #[must_use]
    pub fn read_only(&self) -> ReadOnlyProperty<C> {
        ReadOnlyProperty {
            property: self.clone(),
        }
    }

    // ── Listeners ────────────────────────────────────────────────────────

    pub fn add_listener(&self, listener: ChangeListener<C::Change>) {
        self.inner.changes.add(listener);
    }

    pub fn remove_listener(&self, listener: &ChangeListener<C::Change>) -> bool {
        self.inner.changes.remove(listener)
    }

    pub fn add_invalidation_listener(&self, listener: PropertyInvalidationListener<C>) {
        self.inner.invalidation.add(listener);
    }

    pub fn remove_invalidation_listener(&self, listener: &PropertyInvalidationListener<C>) -> bool {
        self.inner.invalidation.remove(listener)
    }

    pub fn add_value_listener(&self, listener: ValueChangeListener<C>) {
        self.inner.value_change.add(listener);
    }

    pub fn remove_value_listener(&self, listener: &ValueChangeListener<C>) -> bool {
        self.inner.value_change.remove(listener)
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Swap the reference without the bound check.
    fn replace_value(&self, value: Option<C>) {
        let old = self.get();
        let identical = match (&old, &value) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(b),
            _ => false,
        };
        if identical {
            return;
        }
        let retired = self.inner.forwarder.borrow_mut().take();
        if let (Some(old), Some(retired)) = (&old, retired) {
            old.remove_change_listener(&retired);
        }
        self.attach_forwarder(value.as_ref());
        let change = C::transition(old.as_ref(), value.as_ref());
        *self.inner.value.borrow_mut() = value.clone();
        if self.inner.trace_dispatch {
            trace!(
                had_value = old.is_some(),
                has_value = value.is_some(),
                "property reference changed"
            );
        }

        self.sync_derived(value.as_ref());
        self.dispatch_invalidation();
        if let Some(mut change) = change {
            let _transition = Flag::raise(&self.inner.transitioning);
            self.dispatch_change(&mut change);
        }
        self.dispatch_value_change(old.as_ref(), value.as_ref());
    }

    /// Start a new generation and forward changes of `collection` under it.
    ///
    /// A dispatch already in flight on the previous collection may still
    /// hold the retired forwarder; the generation check drops those calls.
    fn attach_forwarder(&self, collection: Option<&C>) {
        let generation = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(generation);
        let forwarder = collection.map(|collection| {
            let weak = Weak::clone(&self.inner.this);
            let forwarder: ChangeListener<C::Change> = Rc::new(move |change: &mut C::Change| {
                let current = weak
                    .upgrade()
                    .filter(|inner| inner.generation.get() == generation);
                if let Some(inner) = current {
                    Property { inner }.refire(change);
                }
            });
            collection.add_change_listener(Rc::clone(&forwarder));
            forwarder
        });
        *self.inner.forwarder.borrow_mut() = forwarder;
    }

    /// Re-fire a change of the current collection.
    fn refire(&self, change: &mut C::Change) {
        let current = self.get();
        self.sync_derived(current.as_ref());
        self.dispatch_invalidation();
        self.dispatch_change(change);
        self.dispatch_value_change(current.as_ref(), current.as_ref());
    }

    fn sync_derived(&self, value: Option<&C>) {
        self.inner.size.set(value.map_or(0, C::len));
        self.inner.empty.set(value.is_none_or(C::is_empty));
    }

    fn dispatch_invalidation(&self) {
        self.inner.invalidation.dispatch(
            &self.inner.boundary,
            ListenerChannel::Invalidation,
            self.inner.trace_dispatch,
            |listener| listener(self),
        );
    }

    fn dispatch_change(&self, change: &mut C::Change) {
        self.inner.changes.dispatch(
            &self.inner.boundary,
            ListenerChannel::ElementChange,
            self.inner.trace_dispatch,
            |listener| {
                change.rewind();
                listener(change);
            },
        );
    }

    fn dispatch_value_change(&self, old: Option<&C>, new: Option<&C>) {
        self.inner.value_change.dispatch(
            &self.inner.boundary,
            ListenerChannel::ValueChange,
            self.inner.trace_dispatch,
            |listener| listener(self, old, new),
        );
    }
}

impl<C: ObservableCollection> Drop for PropertyInner<C> {
    fn drop(&mut self) {
        if let (Some(collection), Some(forwarder)) =
            (self.value.get_mut().take(), self.forwarder.get_mut().take())
        {
            collection.remove_change_listener(&forwarder);
        }
        let this: *const PropertyInner<C> = self;
        if let Some(binding) = self.binding.get_mut().take() {
            binding.detach();
        }
        for binding in self.content_bindings.get_mut().drain(..) {
            binding.detach_from_peer(this);
        }
    }
}

/// Sets a flag for the lifetime of the guard.
struct Flag<'a>(&'a Cell<bool>);

impl<'a> Flag<'a> {
    fn raise(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Flag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Read and listen access to a [`Property`], without `set` or binding.
pub struct ReadOnlyProperty<C: ObservableCollection> {
    property: Property<C>,
}

impl<C: ObservableCollection> Clone for ReadOnlyProperty<C> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
        }
    }
}

impl<C: ObservableCollection> fmt::Debug for ReadOnlyProperty<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyProperty").field(&self.property).finish()
    }
}

impl<C: ObservableCollection> ReadOnlyProperty<C> {
    #[must_use]
    pub fn get(&self) -> Option<C> {
        self.property.get()
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.property.is_bound()
    }

    /// Whether this view was taken from `property`.
    #[must_use]
    pub fn is_view_of(&self, property: &Property<C>) -> bool {
        self.property.ptr_eq(property)
    }

    #[must_use]
    pub fn size_property(&self) -> ObservableValue<usize> {
        self.property.size_property()
    }

    #[must_use]
    pub fn empty_property(&self) -> ObservableValue<bool> {
        self.property.empty_property()
    }

    pub fn add_listener(&self, listener: ChangeListener<C::Change>) {
        self.property.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &ChangeListener<C::Change>) -> bool {
        self.property.remove_listener(listener)
    }

    pub fn add_invalidation_listener(&self, listener: PropertyInvalidationListener<C>) {
        self.property.add_invalidation_listener(listener);
    }

    pub fn remove_invalidation_listener(&self, listener: &PropertyInvalidationListener<C>) -> bool {
        self.property.remove_invalidation_listener(listener)
    }

    pub fn add_value_listener(&self, listener: ValueChangeListener<C>) {
        self.property.add_value_listener(listener);
    }

    pub fn remove_value_listener(&self, listener: &ValueChangeListener<C>) -> bool {
        self.property.remove_value_listener(listener)
    }
}
