#![forbid(unsafe_code)]

//! Observable collections and bindable collection properties for FrankenTUI.
//!
//! This crate provides change-notifying containers and the properties that
//! expose them to a UI model:
//!
//! - [`ObservableList`], [`ObservableSet`], [`ObservableMap`],
//!   [`ObservableMultiset`], [`ObservableSetMultimap`]: shared containers
//!   that report every effective mutation as one atomic [`Change`].
//! - [`Change`]: an ordered sequence of elementary changes with a
//!   forward-only cursor, plus per-kind accessors and fixed `Display`
//!   wording for diagnostics.
//! - [`diff`]: the pure functions computing minimal elementary changes.
//! - [`Property`]: a collection-valued property with reference binding and
//!   content binding.
//! - [`ExceptionBoundary`]: panic isolation around every listener call,
//!   reporting to an injected fault sink.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc<RefCell<..>>`). Listener dispatch
//! iterates a snapshot taken when firing starts and holds no borrow while
//! listeners run, so listeners may read, mutate, and (un)register
//! re-entrantly.
//!
//! # Invariants
//!
//! 1. A mutation that changes nothing fires nothing.
//! 2. Invalidation listeners run before element-change listeners.
//! 3. A listener registered N times runs N times per dispatch.
//! 4. A panicking listener never reaches the mutator.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ftui_collections::{ListChange, ObservableList};
//!
//! let list = ObservableList::from_vec(vec![1, 2, 3, 4, 5, 6]);
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! list.add_listener(Rc::new(move |change: &mut ListChange<i32>| {
//!     sink.borrow_mut().push(change.to_string());
//! }));
//!
//! list.remove_all(&[4, 2]).unwrap();
//! assert_eq!(*log.borrow(), vec!["Removed [2] at 1. Removed [4] at 2."]);
//! ```

pub mod change;
pub mod collection;
pub mod config;
pub mod diff;
pub mod error;
pub mod fault;
pub mod listener;
pub mod property;
pub mod value;

pub use change::{
    AtomicChange, Change, CursorState, ListChange, ListEdit, ListElementaryChange, MapChange,
    MapElementaryChange, MultisetChange, MultisetElementaryChange, SetChange,
    SetElementaryChange, SetMultimapChange, SetMultimapElementaryChange,
};
pub use collection::{
    ChangeListener, InvalidationListener, ObservableCollection, ObservableList, ObservableMap,
    ObservableMultiset, ObservableSet, ObservableSetMultimap,
};
pub use config::DispatchConfig;
pub use error::{CollectionError, CollectionResult, ErrorKind};
pub use fault::{ExceptionBoundary, FaultSink, ListenerFault};
pub use listener::{ListenerChannel, ListenerRegistry};
pub use property::{
    ListProperty, MapProperty, MultisetProperty, Property, PropertyInvalidationListener,
    ReadOnlyProperty, SetMultimapProperty, SetProperty, ValueChangeListener,
};
pub use value::{ObservableValue, Subscription};
