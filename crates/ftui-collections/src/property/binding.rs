#![forbid(unsafe_code)]

//! Reference and content binding between properties.
//!
//! Reference binding makes a property track another property's collection
//! handle. Content binding keeps two independently owned collections
//! content-equal by replaying every element change of one side through the
//! mutators of the other side's current collection.
//!
//! ```text
//!  a.bind_content_bidirectional(b)
//!
//!   a.changes ──forward──► replay on b.get()
//!   b.changes ──backward─► replay on a.get()
//!         (shared guard suppresses the echo)
//! ```
//!
//! Bindings hold their peers weakly: dropping either side leaves the other
//! independently usable, and dropping a property detaches every listener it
//! installed on its peers.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::{Flag, Property, PropertyInner, ValueChangeListener};
use crate::collection::{ChangeListener, ObservableCollection};
use crate::error::{CollectionError, CollectionResult};

/// This property tracks `source`'s value through `listener`.
pub(super) struct ReferenceBinding<C: ObservableCollection> {
    source: Weak<PropertyInner<C>>,
    listener: ValueChangeListener<C>,
}

impl<C: ObservableCollection> ReferenceBinding<C> {
    /// Remove the tracking listener from the source, if it is still alive.
    pub(super) fn detach(self) {
        if let Some(source) = self.source.upgrade() {
            source.value_change.remove(&self.listener);
        }
    }
}

/// One content binding, as recorded on one side.
pub(super) struct ContentBinding<C: ObservableCollection> {
    peer: Weak<PropertyInner<C>>,
    bidirectional: bool,
    /// Registered on this property; replays onto the peer.
    outgoing: Option<ChangeListener<C::Change>>,
    /// Registered on the peer; replays onto this property.
    incoming: Option<ChangeListener<C::Change>>,
}

impl<C: ObservableCollection> ContentBinding<C> {
    fn is_with(&self, peer: &Rc<PropertyInner<C>>) -> bool {
        std::ptr::eq(self.peer.as_ptr(), Rc::as_ptr(peer))
    }

    /// Remove the listener installed on the peer and the peer's record of
    /// this binding. `this` identifies the side being dropped.
    pub(super) fn detach_from_peer(self, this: *const PropertyInner<C>) {
        let Some(peer) = self.peer.upgrade() else {
            return;
        };
        if let Some(incoming) = &self.incoming {
            peer.changes.remove(incoming);
        }
        peer.content_bindings
            .borrow_mut()
            .retain(|binding| !std::ptr::eq(binding.peer.as_ptr(), this));
    }
}

impl<C: ObservableCollection> Property<C> {
    /// Whether this property is reference-bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.binding.borrow().is_some()
    }

    /// Whether this property is reference-bound to `source`.
    #[must_use]
    pub fn is_bound_to(&self, source: &Self) -> bool {
        self.inner
            .binding
            .borrow()
            .as_ref()
            .is_some_and(|binding| std::ptr::eq(binding.source.as_ptr(), Rc::as_ptr(&source.inner)))
    }

    /// Whether a content binding (in either direction) links this property
    /// and `peer`.
    #[must_use]
    pub fn is_content_bound_to(&self, peer: &Self) -> bool {
        self.content_binding(peer).is_some() || peer.content_binding(self).is_some()
    }

    /// Track `source`: adopt its value now and follow every later change.
    /// Replaces any previous reference binding.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NullArgument`] for `None`,
    /// [`CollectionError::SelfReference`] for this property, and
    /// [`CollectionError::ConflictingBinding`] when content-bound to `source`.
    pub fn bind(&self, source: Option<&Self>) -> CollectionResult<()> {
        let source = self.peer(source, "bind")?;
        if self.is_content_bound_to(source) {
            return Err(CollectionError::ConflictingBinding);
        }
        if self.is_bound_to(source) {
            return Ok(());
        }
        self.unbind();

        let target = Weak::clone(&self.inner.this);
        let listener: ValueChangeListener<C> =
            Rc::new(move |_: &Property<C>, _: Option<&C>, new: Option<&C>| {
                if let Some(inner) = target.upgrade() {
                    Property { inner }.replace_value(new.cloned());
                }
            });
        source.inner.value_change.add(Rc::clone(&listener));
        *self.inner.binding.borrow_mut() = Some(ReferenceBinding {
            source: Rc::downgrade(&source.inner),
            listener,
        });
        debug!("property bound to source");
        self.replace_value(source.get());
        Ok(())
    }

    /// Stop tracking the source. No-op when unbound.
    pub fn unbind(&self) {
        let binding = self.inner.binding.borrow_mut().take();
        if let Some(binding) = binding {
            binding.detach();
            debug!("property unbound");
        }
    }

    /// Keep this property's collection and `peer`'s collection
    /// content-equal, mirroring changes both ways. This side first adopts
    /// the peer's contents.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NullArgument`] for `None`,
    /// [`CollectionError::SelfReference`] for this property,
    /// [`CollectionError::ConflictingBinding`] when reference-bound to or
    /// from `peer` or content-bound to it in the other direction, and any
    /// error of the initial copy (for example a read-only collection).
    pub fn bind_content_bidirectional(&self, peer: Option<&Self>) -> CollectionResult<()> {
        let peer = self.peer(peer, "bind_content_bidirectional")?;
        if self.check_content_request(peer, true)? {
            return Ok(());
        }
        self.copy_contents_from(peer)?;

        let guard = Rc::new(Cell::new(false));
        let forward = mirror(&self.inner, &peer.inner, &guard);
        let backward = mirror(&peer.inner, &self.inner, &guard);
        self.inner.changes.add(Rc::clone(&forward));
        peer.inner.changes.add(Rc::clone(&backward));
        self.inner.content_bindings.borrow_mut().push(ContentBinding {
            peer: Rc::downgrade(&peer.inner),
            bidirectional: true,
            outgoing: Some(Rc::clone(&forward)),
            incoming: Some(Rc::clone(&backward)),
        });
        peer.inner.content_bindings.borrow_mut().push(ContentBinding {
            peer: Rc::downgrade(&self.inner),
            bidirectional: true,
            outgoing: Some(backward),
            incoming: Some(forward),
        });
        debug!("bidirectional content binding established");
        Ok(())
    }

    /// Keep this property's collection content-equal to `source`'s,
    /// mirroring changes of `source` only. This side first adopts the
    /// source's contents.
    ///
    /// # Errors
    ///
    /// Same as [`Property::bind_content_bidirectional`].
    pub fn bind_content(&self, source: Option<&Self>) -> CollectionResult<()> {
        let source = self.peer(source, "bind_content")?;
        if self.check_content_request(source, false)? {
            return Ok(());
        }
        self.copy_contents_from(source)?;

        let guard = Rc::new(Cell::new(false));
        let incoming = mirror(&source.inner, &self.inner, &guard);
        source.inner.changes.add(Rc::clone(&incoming));
        self.inner.content_bindings.borrow_mut().push(ContentBinding {
            peer: Rc::downgrade(&source.inner),
            bidirectional: false,
            outgoing: None,
            incoming: Some(incoming),
        });
        debug!("content binding established");
        Ok(())
    }

    /// Remove a binding made by [`Property::bind_content_bidirectional`],
    /// from either side.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NullArgument`] for `None`,
    /// [`CollectionError::SelfReference`] for this property, and
    /// [`CollectionError::NotContentBound`] when no such binding exists.
    pub fn unbind_content_bidirectional(&self, peer: Option<&Self>) -> CollectionResult<()> {
        let peer = self.peer(peer, "unbind_content_bidirectional")?;
        let binding = self
            .take_content_binding(peer, true)
            .ok_or(CollectionError::NotContentBound)?;
        self.detach(&binding, peer);
        peer.take_content_binding(self, true);
        debug!("bidirectional content binding removed");
        Ok(())
    }

    /// Remove a binding made by [`Property::bind_content`].
    ///
    /// # Errors
    ///
    /// Same as [`Property::unbind_content_bidirectional`].
    pub fn unbind_content(&self, source: Option<&Self>) -> CollectionResult<()> {
        let source = self.peer(source, "unbind_content")?;
        let binding = self
            .take_content_binding(source, false)
            .ok_or(CollectionError::NotContentBound)?;
        self.detach(&binding, source);
        debug!("content binding removed");
        Ok(())
    }

    fn peer<'a>(&self, peer: Option<&'a Self>, operation: &'static str) -> CollectionResult<&'a Self> {
        let peer = peer.ok_or(CollectionError::NullArgument { operation })?;
        if self.ptr_eq(peer) {
            return Err(CollectionError::SelfReference { operation });
        }
        Ok(peer)
    }

    /// `Ok(true)` when the identical binding already exists.
    fn check_content_request(&self, peer: &Self, bidirectional: bool) -> CollectionResult<bool> {
        if self.is_bound_to(peer) || peer.is_bound_to(self) {
            return Err(CollectionError::ConflictingBinding);
        }
        if let Some(existing) = self.content_binding(peer) {
            return if existing == bidirectional {
                Ok(true)
            } else {
                Err(CollectionError::ConflictingBinding)
            };
        }
        if peer.content_binding(self).is_some() {
            return Err(CollectionError::ConflictingBinding);
        }
        Ok(false)
    }

    /// Direction of this side's binding record for `peer`.
    fn content_binding(&self, peer: &Self) -> Option<bool> {
        self.inner
            .content_bindings
            .borrow()
            .iter()
            .find(|binding| binding.is_with(&peer.inner))
            .map(|binding| binding.bidirectional)
    }

    fn take_content_binding(&self, peer: &Self, bidirectional: bool) -> Option<ContentBinding<C>> {
        let mut bindings = self.inner.content_bindings.borrow_mut();
        let index = bindings
            .iter()
            .position(|binding| binding.is_with(&peer.inner) && binding.bidirectional == bidirectional)?;
        Some(bindings.remove(index))
    }

    fn detach(&self, binding: &ContentBinding<C>, peer: &Self) {
        if let Some(outgoing) = &binding.outgoing {
            self.inner.changes.remove(outgoing);
        }
        if let Some(incoming) = &binding.incoming {
            peer.inner.changes.remove(incoming);
        }
    }

    fn copy_contents_from(&self, source: &Self) -> CollectionResult<()> {
        let Some(mine) = self.get() else {
            return Ok(());
        };
        let theirs = source.get();
        if theirs.as_ref().is_some_and(|theirs| theirs.same_as(&mine)) {
            return Ok(());
        }
        mine.assign_from(theirs.as_ref()).map(|_| ())
    }
}

/// Listener for `source`'s element-change channel that reproduces each
/// change on `target`'s current collection.
///
/// A change caused by `source` switching to another collection is mirrored
/// by copying the new contents, so the sides stay equal even if they had
/// drifted.
fn mirror<C: ObservableCollection>(
    source: &Rc<PropertyInner<C>>,
    target: &Rc<PropertyInner<C>>,
    guard: &Rc<Cell<bool>>,
) -> ChangeListener<C::Change> {
    let source = Rc::downgrade(source);
    let target = Rc::downgrade(target);
    let guard = Rc::clone(guard);
    Rc::new(move |change: &mut C::Change| {
        if guard.get() {
            return;
        }
        let (Some(source), Some(target)) = (source.upgrade(), target.upgrade()) else {
            return;
        };
        let Some(destination) = target.value.borrow().clone() else {
            debug!("content mirror skipped: target has no collection");
            return;
        };
        let origin = source.value.borrow().clone();
        if origin.as_ref().is_some_and(|origin| origin.same_as(&destination)) {
            debug!("content mirror skipped: both sides share one collection");
            return;
        }
        let _updating = Flag::raise(&guard);
        let result = if source.transitioning.get() {
            destination.assign_from(origin.as_ref()).map(|_| ())
        } else {
            destination.replay(change)
        };
        if let Err(err) = result {
            warn!(%err, "content binding replay failed");
        }
    })
}
