#![forbid(unsafe_code)]

//! Ordered listener multisets with snapshot dispatch.
//!
//! # Design
//!
//! A [`ListenerRegistry`] stores listeners as `Rc<F>` in registration order.
//! Identity is pointer identity (`Rc::ptr_eq`), so the same `Rc` may be
//! registered several times and is then invoked once per registration.
//!
//! Dispatch copies the `Rc`s out of the registry before calling anything,
//! and no borrow is held while a listener runs. Listeners may therefore
//! add or remove listeners (themselves included) during a dispatch; such
//! edits take effect from the next dispatch on.
//!
//! # Invariants
//!
//! 1. Listeners are invoked in registration order.
//! 2. `remove` drops exactly one occurrence (the earliest).
//! 3. A dispatch visits exactly the listeners registered when it started.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::fault::ExceptionBoundary;

/// Notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerChannel {
    /// Payload-free "something changed" notification.
    Invalidation,
    /// Carries the atomic change.
    ElementChange,
    /// Carries the old and new property value.
    ValueChange,
}

impl fmt::Display for ListenerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invalidation => "invalidation",
            Self::ElementChange => "element-change",
            Self::ValueChange => "value-change",
        })
    }
}

/// Ordered multiset of listeners for one channel.
pub struct ListenerRegistry<F: ?Sized> {
    entries: RefCell<Vec<Rc<F>>>,
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> fmt::Debug for ListenerRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl<F: ?Sized> ListenerRegistry<F> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration.
    pub fn add(&self, listener: Rc<F>) {
        self.entries.borrow_mut().push(listener);
    }

    /// Remove one registration of `listener`. Returns whether one was found.
    pub fn remove(&self, listener: &Rc<F>) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of registrations (duplicates counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// How many times `listener` is registered.
    #[must_use]
    pub fn multiplicity(&self, listener: &Rc<F>) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|l| Rc::ptr_eq(l, listener))
            .count()
    }

    /// Copy of the current registrations.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rc<F>> {
        self.entries.borrow().clone()
    }

    /// Invoke every listener of the current snapshot through `boundary`.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn dispatch(
        &self,
        boundary: &ExceptionBoundary,
        channel: ListenerChannel,
        trace_dispatch: bool,
        mut call: impl FnMut(&F),
    ) -> usize {
        let listeners = self.snapshot();
        if listeners.is_empty() {
            return 0;
        }
        if trace_dispatch {
            trace!(%channel, listeners = listeners.len(), "dispatching");
        }
        let mut completed = 0;
        for listener in &listeners {
            let listener: &F = listener;
            if boundary.invoke(channel, || call(listener)) {
                completed += 1;
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Callback = dyn Fn(&Cell<u32>);

    fn counter() -> Rc<Callback> {
        Rc::new(|count: &Cell<u32>| count.set(count.get() + 1))
    }

    #[test]
    fn duplicate_registration_fires_twice() {
        let registry: ListenerRegistry<Callback> = ListenerRegistry::new();
        let listener = counter();
        registry.add(Rc::clone(&listener));
        registry.add(Rc::clone(&listener));
        assert_eq!(registry.multiplicity(&listener), 2);

        let count = Cell::new(0);
        registry.dispatch(
            &ExceptionBoundary::default(),
            ListenerChannel::Invalidation,
            false,
            |l| l(&count),
        );
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn remove_drops_one_occurrence() {
        let registry: ListenerRegistry<Callback> = ListenerRegistry::new();
        let listener = counter();
        registry.add(Rc::clone(&listener));
        registry.add(Rc::clone(&listener));
        assert!(registry.remove(&listener));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&listener));
        assert!(!registry.remove(&listener));
        assert!(registry.is_empty());
    }

    #[test]
    fn dispatch_in_registration_order() {
        let registry: ListenerRegistry<dyn Fn(&RefCell<Vec<char>>)> = ListenerRegistry::new();
        for c in ['A', 'B', 'C'] {
            registry.add(Rc::new(move |log: &RefCell<Vec<char>>| log.borrow_mut().push(c)));
        }
        let log = RefCell::new(Vec::new());
        registry.dispatch(
            &ExceptionBoundary::default(),
            ListenerChannel::ElementChange,
            false,
            |l| l(&log),
        );
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn panicking_listener_does_not_stop_dispatch() {
        let registry: ListenerRegistry<Callback> = ListenerRegistry::new();
        registry.add(counter());
        registry.add(Rc::new(|_: &Cell<u32>| panic!("listener bug")));
        registry.add(counter());

        let count = Cell::new(0);
        let completed = registry.dispatch(
            &ExceptionBoundary::new(&crate::config::DispatchConfig::new().with_fault_sink(|_| {})),
            ListenerChannel::Invalidation,
            true,
            |l| l(&count),
        );
        assert_eq!(count.get(), 2);
        assert_eq!(completed, 2);
    }

    #[test]
    fn reentrant_registration_uses_snapshot() {
        let registry: Rc<ListenerRegistry<Callback>> = Rc::new(ListenerRegistry::new());
        let weak = Rc::downgrade(&registry);
        registry.add(Rc::new(move |count: &Cell<u32>| {
            count.set(count.get() + 1);
            if let Some(registry) = weak.upgrade() {
                registry.add(counter());
            }
        }));

        let count = Cell::new(0);
        let boundary = ExceptionBoundary::default();
        registry.dispatch(&boundary, ListenerChannel::Invalidation, false, |l| l(&count));
        // The listener added mid-dispatch does not run in the same round.
        assert_eq!(count.get(), 1);
        assert_eq!(registry.len(), 2);

        count.set(0);
        registry.dispatch(&boundary, ListenerChannel::Invalidation, false, |l| l(&count));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn channel_display() {
        assert_eq!(ListenerChannel::ElementChange.to_string(), "element-change");
    }
}
