#![forbid(unsafe_code)]

//! Multiset changes: occurrence-count deltas per element.

use std::fmt;

use super::Change;
use crate::error::CollectionResult;

/// Occurrences of one element removed and/or added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisetElementaryChange<E> {
    element: E,
    remove_count: usize,
    add_count: usize,
}

impl<E> MultisetElementaryChange<E> {
    /// General constructor; at least one count should be non-zero.
    #[must_use]
    pub fn new(element: E, remove_count: usize, add_count: usize) -> Self {
        Self {
            element,
            remove_count,
            add_count,
        }
    }

    /// `count` occurrences added.
    #[must_use]
    pub fn added(element: E, count: usize) -> Self {
        Self::new(element, 0, count)
    }

    /// `count` occurrences removed.
    #[must_use]
    pub fn removed(element: E, count: usize) -> Self {
        Self::new(element, count, 0)
    }

    #[must_use]
    pub fn element(&self) -> &E {
        &self.element
    }

    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.remove_count
    }

    #[must_use]
    pub fn add_count(&self) -> usize {
        self.add_count
    }
}

impl<E: fmt::Debug> fmt::Display for MultisetElementaryChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.remove_count, self.add_count) {
            (0, added) => write!(f, "Added {added} occurrences of {:?}.", self.element),
            (removed, 0) => write!(f, "Removed {removed} occurrences of {:?}.", self.element),
            (removed, added) => write!(
                f,
                "Replaced {removed} occurrences of {:?} by {added}.",
                self.element
            ),
        }
    }
}

/// Atomic change of an observable multiset.
pub type MultisetChange<E> = Change<MultisetElementaryChange<E>>;

impl<E> Change<MultisetElementaryChange<E>> {
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn element(&self) -> CollectionResult<&E> {
        Ok(self.current()?.element())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn add_count(&self) -> CollectionResult<usize> {
        Ok(self.current()?.add_count())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn remove_count(&self) -> CollectionResult<usize> {
        Ok(self.current()?.remove_count())
    }
}
