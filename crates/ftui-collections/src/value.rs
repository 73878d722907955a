#![forbid(unsafe_code)]

//! Observable scalar value with change notification and version tracking.
//!
//! Properties expose their derived `size` and `empty` values through
//! [`ObservableValue`]; it is public so callers can subscribe to them.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 on each value-changing mutation.
//! 2. `set(v)` where `v == current` is a no-op.
//! 3. Subscribers are notified in registration order, outside any borrow.
//! 4. A panicking subscriber is isolated by the value's
//!    [`ExceptionBoundary`]; later subscribers still run.
//! 5. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: [`Subscription`] guards stored indefinitely keep
//!   their callbacks alive. Dead weak references are cleaned on `notify()`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::DispatchConfig;
use crate::fault::ExceptionBoundary;
use crate::listener::ListenerChannel;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ValueInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning yields a second handle to the same value and subscribers.
pub struct ObservableValue<T> {
    inner: Rc<RefCell<ValueInner<T>>>,
    boundary: ExceptionBoundary,
}

impl<T> Clone for ObservableValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            boundary: self.boundary.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableValue")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> {
    /// Create a value with version 0 and no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_config(value, &DispatchConfig::default())
    }

    /// Create a value whose subscriber faults go through `config`.
    #[must_use]
    pub fn with_config(value: T, config: &DispatchConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ValueInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
            boundary: ExceptionBoundary::new(config),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Set a new value; subscribers run only if it differs.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Subscribe to changes. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        let value = self.get();
        for callback in &callbacks {
            self.boundary
                .invoke(ListenerChannel::ValueChange, || callback(&value));
        }
    }
}

/// RAII guard for an [`ObservableValue`] subscriber.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
