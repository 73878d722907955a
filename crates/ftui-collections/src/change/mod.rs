#![forbid(unsafe_code)]

//! Atomic changes and their forward-only cursor.
//!
//! An atomic change is the unit a listener receives: an ordered sequence of
//! elementary changes plus a cursor. The cursor starts before the first
//! elementary change; [`Change::next`] moves it forward and every accessor
//! of the per-kind views requires it to be positioned on an elementary
//! change.
//!
//! ```text
//!  BeforeFirst --next()--> At(0) --next()--> At(1) ... --next()--> AfterLast
//!       ^                                                              |
//!       +---------------------------- reset() -------------------------+
//! ```
//!
//! The per-kind accessors live next to their elementary change types:
//! [`list`], [`set`], [`map`], [`multiset`], [`multimap`].

pub mod list;
pub mod map;
pub mod multimap;
pub mod multiset;
pub mod set;

use std::fmt;

use crate::error::{CollectionError, CollectionResult};

pub use list::{ListChange, ListEdit, ListElementaryChange};
pub use map::{MapChange, MapElementaryChange};
pub use multimap::{SetMultimapChange, SetMultimapElementaryChange};
pub use multiset::{MultisetChange, MultisetElementaryChange};
pub use set::{SetChange, SetElementaryChange};

/// Position of a change cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    /// No elementary change consumed yet.
    BeforeFirst,
    /// Positioned on the elementary change with this index.
    At(usize),
    /// `next()` has returned `false`.
    AfterLast,
}

/// An atomic change: ordered elementary changes `D`, a cursor over them, and
/// per-kind context `X` (the post-change contents for lists).
#[derive(Debug, Clone, PartialEq)]
pub struct Change<D, X = ()> {
    changes: Vec<D>,
    state: CursorState,
    context: X,
}

impl<D> Change<D> {
    /// Package elementary changes without extra context.
    #[must_use]
    pub fn new(changes: Vec<D>) -> Self {
        Self::with_context(changes, ())
    }
}

impl<D, X> Change<D, X> {
    /// Package elementary changes together with kind-specific context.
    #[must_use]
    pub fn with_context(changes: Vec<D>, context: X) -> Self {
        Self {
            changes,
            state: CursorState::BeforeFirst,
            context,
        }
    }

    /// Advance to the next elementary change.
    ///
    /// Returns `false` (and parks the cursor after the last change) when no
    /// elementary change is left.
    pub fn next(&mut self) -> bool {
        let next = match self.state {
            CursorState::BeforeFirst => 0,
            CursorState::At(index) => index + 1,
            CursorState::AfterLast => return false,
        };
        if next < self.changes.len() {
            self.state = CursorState::At(next);
            true
        } else {
            self.state = CursorState::AfterLast;
            false
        }
    }

    /// Rewind the cursor to before the first elementary change.
    pub fn reset(&mut self) {
        self.state = CursorState::BeforeFirst;
    }

    /// Current cursor position.
    #[must_use]
    pub fn cursor(&self) -> CursorState {
        self.state
    }

    /// The elementary change under the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::CursorNotPositioned`] before the first
    /// `next()` or after `next()` returned `false`.
    pub fn current(&self) -> CollectionResult<&D> {
        match self.state {
            CursorState::At(index) => Ok(&self.changes[index]),
            state => Err(CollectionError::CursorNotPositioned { state }),
        }
    }

    /// All elementary changes, oldest first, independent of the cursor.
    #[must_use]
    pub fn elementary_changes(&self) -> &[D] {
        &self.changes
    }

    /// Number of elementary changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the change carries no elementary change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub(crate) fn context(&self) -> &X {
        &self.context
    }
}

impl<D: fmt::Display, X> fmt::Display for Change<D, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{change}")?;
        }
        Ok(())
    }
}

/// Cursor protocol shared by every atomic change kind.
///
/// Generic code (properties, bindings) rewinds a change before handing it to
/// each listener and reads the elementary changes when replaying them.
pub trait AtomicChange {
    /// Elementary change type.
    type Elementary;

    /// Rewind the cursor.
    fn rewind(&mut self);

    /// All elementary changes, oldest first.
    fn elementaries(&self) -> &[Self::Elementary];
}

impl<D, X> AtomicChange for Change<D, X> {
    type Elementary = D;

    fn rewind(&mut self) {
        self.reset();
    }

    fn elementaries(&self) -> &[D] {
        self.elementary_changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_forward_then_parks() {
        let mut change = Change::new(vec!['a', 'b']);
        assert_eq!(change.cursor(), CursorState::BeforeFirst);
        assert!(change.next());
        assert_eq!(change.current(), Ok(&'a'));
        assert!(change.next());
        assert_eq!(change.current(), Ok(&'b'));
        assert!(!change.next());
        assert_eq!(change.cursor(), CursorState::AfterLast);
        assert!(!change.next());
    }

    #[test]
    fn accessor_before_first_is_an_error() {
        let change = Change::new(vec![1]);
        assert_eq!(
            change.current(),
            Err(CollectionError::CursorNotPositioned {
                state: CursorState::BeforeFirst
            })
        );
    }

    #[test]
    fn accessor_after_last_is_an_error() {
        let mut change = Change::new(vec![1]);
        while change.next() {}
        assert!(matches!(
            change.current(),
            Err(CollectionError::CursorNotPositioned {
                state: CursorState::AfterLast
            })
        ));
    }

    #[test]
    fn reset_rewinds() {
        let mut change = Change::new(vec![1, 2]);
        while change.next() {}
        change.reset();
        assert!(change.next());
        assert_eq!(change.current(), Ok(&1));
    }

    #[test]
    fn empty_change_never_positions() {
        let mut change: Change<u8> = Change::new(Vec::new());
        assert!(change.is_empty());
        assert!(!change.next());
        assert!(change.current().is_err());
    }

    #[test]
    fn display_joins_with_space() {
        let change = Change::new(vec!["x.", "y."]);
        assert_eq!(change.to_string(), "x. y.");
    }
}
